//! augmented_lagrangian — pure-Rust NLP backend on argmin L-BFGS.
//!
//! Purpose
//! -------
//! Provide a [`SolverBackend`] that needs no native solver library, so a
//! [`Minimize`](crate::optimization::nlp_adapter::Minimize) request can run
//! end to end. The problem is consumed only through [`NlpProblem`].
//!
//! Key behaviors
//! -------------
//! - [`AugmentedLagrangian::create`] checks the bound vectors against
//!   `(n, m)` and builds the [`merit::TermLayout`] once per run.
//! - [`AlSolver::add_option`] validates options via [`config::AlConfig`].
//! - [`AlSolver::solve`] delegates to [`run::run_augmented_lagrangian`].
//!
//! Conventions
//! -----------
//! - Statuses and messages follow interior-point numbering, so results
//!   read the same as with a native interior-point solver.
//! - Second derivatives are never requested; only the
//!   `"limited-memory"` Hessian approximation is accepted.
pub mod config;
pub mod merit;
pub mod run;

use crate::optimization::{
    errors::{NlpError, NlpResult},
    nlp_adapter::{
        options::OptionValue,
        traits::{NlpProblem, NlpSolver, ProblemBounds, SolverBackend, SolverInfo},
        types::Point,
    },
};

use self::{config::AlConfig, merit::TermLayout, run::run_augmented_lagrangian};

/// Backend factory. `base` is the configuration every solver starts from
/// before options are applied.
#[derive(Debug, Clone, Default)]
pub struct AugmentedLagrangian {
    pub base: AlConfig,
}

impl AugmentedLagrangian {
    pub fn new(base: AlConfig) -> Self {
        Self { base }
    }
}

impl SolverBackend for AugmentedLagrangian {
    fn create<'p>(
        &self, n: usize, m: usize, problem: &'p dyn NlpProblem, bounds: ProblemBounds,
    ) -> NlpResult<Box<dyn NlpSolver + 'p>> {
        check_len(n, bounds.x_lower.as_ref().map_or(n, |v| v.len()))?;
        check_len(n, bounds.x_upper.as_ref().map_or(n, |v| v.len()))?;
        check_len(m, bounds.g_lower.len())?;
        check_len(m, bounds.g_upper.len())?;
        let layout = TermLayout::new(n, &bounds);
        log::debug!("augmented Lagrangian backend: n={n} m={m} terms={}", layout.len());
        Ok(Box::new(AlSolver { problem, layout, config: self.base.clone() }))
    }
}

/// Solver bound to one problem object.
pub struct AlSolver<'p> {
    problem: &'p dyn NlpProblem,
    layout: TermLayout,
    config: AlConfig,
}

impl AlSolver<'_> {
    pub fn config(&self) -> &AlConfig {
        &self.config
    }
}

impl NlpSolver for AlSolver<'_> {
    fn add_option(&mut self, name: &str, value: &OptionValue) -> Result<(), String> {
        self.config.set(name, value)
    }

    fn solve(&mut self, x0: &Point) -> NlpResult<(Point, SolverInfo)> {
        check_len(self.layout.n, x0.len())?;
        run_augmented_lagrangian(self.problem, &self.layout, &self.config, x0)
    }
}

// ---- Helper Methods ----

fn check_len(expected: usize, found: usize) -> NlpResult<()> {
    if expected != found {
        return Err(NlpError::BoundsLengthMismatch { expected, found });
    }
    Ok(())
}
