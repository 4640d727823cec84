//! nlp_adapter::adapter — the problem object a solver drives.
//!
//! Purpose
//! -------
//! Bridge user callbacks (objective, gradient, constraints) to the
//! [`NlpProblem`] interface, applying extra arguments, synthesizing missing
//! derivatives by forward differences, and counting evaluations.
//!
//! Key behaviors
//! -------------
//! - `objective` / `gradient` dispatch on the resolved [`Evaluator`]:
//!   - `Approximate`: scalar objective, gradient by forward differences.
//!   - `Separate`: scalar objective plus a standalone gradient.
//!   - `Combined`: one `(value, gradient)` call per distinct point, memoized
//!     in a one-slot cache keyed by exact point equality.
//! - `constraints` concatenates every constraint's output in list order.
//! - `jacobian` stacks every constraint's Jacobian block (analytic or
//!   forward-difference) row-wise in the same order.
//! - `intermediate` records the solver's iteration index and never asks the
//!   solver to stop.
//!
//! Invariants & assumptions
//! ------------------------
//! - `nfev` counts objective evaluations issued by the solver; in combined
//!   mode it counts combined calls, and cache hits are free.
//! - `njev` counts gradient requests in non-combined modes only.
//! - Finite-difference probes call the user function directly and are not
//!   counted.
//! - Gradient length and Jacobian block shapes are checked; values are not.
//! - Once [`ProblemAdapter::constraint_bounds`] has probed the constraints,
//!   every later evaluation must keep the probed arity.
//!
//! Conventions
//! -----------
//! - Run-scoped state (cache, counters, arities) lives in `Cell`/`RefCell`,
//!   so the adapter serves one sequential run and is not `Sync`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover counter behavior in every evaluator mode, cache
//!   invalidation, stacking order, and shape validation.
use std::cell::{Cell, OnceCell, RefCell};

use ndarray::s;

use crate::optimization::{
    errors::{NlpError, NlpResult},
    nlp_adapter::{
        args::Args,
        bounds::{ConstraintBounds, constraint_bounds},
        constraints::{ConstraintSet, ConstraintSpec},
        finite_diff::{FdStep, forward_diff_gradient, forward_diff_jacobian},
        objective::{CombinedFn, Evaluator, GradientSpec, Objective, SecondOrder, resolve_evaluator},
        traits::{IterationReport, NlpProblem},
        types::{ConstraintValues, Cost, Grad, Jacobian, Point},
        validation::{validate_arity, validate_grad, validate_jacobian_block},
    },
};

/// Evaluation counters of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvalCounters {
    pub nfev: usize,
    pub njev: usize,
    pub nit: usize,
}

/// Last combined evaluation.
#[derive(Debug, Clone)]
struct CachedEval {
    x: Point,
    value: Cost,
    grad: Grad,
}

/// Problem object for one optimization run.
pub struct ProblemAdapter {
    evaluator: Evaluator,
    args: Args,
    constraints: ConstraintSet,
    fd_step: FdStep,
    n: usize,
    arities: OnceCell<Vec<usize>>,
    cache: RefCell<Option<CachedEval>>,
    nfev: Cell<usize>,
    njev: Cell<usize>,
    nit: Cell<usize>,
}

impl ProblemAdapter {
    /// Build an adapter for an `n`-variable problem.
    ///
    /// # Errors
    /// - [`NlpError::UnsupportedFeature`] if any second-order callback is present.
    /// - [`NlpError::InvalidGradientSpec`] for an illegal objective/gradient pairing.
    /// - [`NlpError::EmptyProblem`] if `n == 0`.
    pub fn new(
        objective: Objective, gradient: GradientSpec, second_order: &SecondOrder, n: usize,
    ) -> NlpResult<Self> {
        second_order.reject()?;
        let evaluator = resolve_evaluator(objective, gradient)?;
        if n == 0 {
            return Err(NlpError::EmptyProblem);
        }
        Ok(Self {
            evaluator,
            args: Args::default(),
            constraints: ConstraintSet::new(),
            fd_step: FdStep::default(),
            n,
            arities: OnceCell::new(),
            cache: RefCell::new(None),
            nfev: Cell::new(0),
            njev: Cell::new(0),
            nit: Cell::new(0),
        })
    }

    /// Extra arguments passed to the objective and gradient.
    pub fn with_args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    pub fn with_constraints(mut self, constraints: ConstraintSet) -> Self {
        self.constraints = constraints;
        self
    }

    /// # Errors
    /// [`NlpError::InvalidStep`] for a non-positive fixed step.
    pub fn with_fd_step(mut self, step: FdStep) -> NlpResult<Self> {
        step.validate()?;
        self.fd_step = step;
        Ok(self)
    }

    /// Probe every constraint at `x0`, fix the arities, and return the
    /// stacked constraint bounds.
    ///
    /// # Errors
    /// Any error raised by a constraint function at `x0`.
    pub fn constraint_bounds(&self, x0: &Point) -> NlpResult<ConstraintBounds> {
        let bounds = constraint_bounds(&self.constraints, x0)?;
        if self.arities.get().is_none() {
            let _ = self.arities.set(bounds.arities.clone());
        }
        Ok(bounds)
    }

    pub fn dimension(&self) -> usize {
        self.n
    }

    /// Number of stacked constraint rows `m = Σ m_i`, known once
    /// [`Self::constraint_bounds`] has probed the constraints.
    pub fn constraint_count(&self) -> Option<usize> {
        self.arities.get().map(|a| a.iter().sum())
    }

    pub fn counters(&self) -> EvalCounters {
        EvalCounters { nfev: self.nfev.get(), njev: self.njev.get(), nit: self.nit.get() }
    }

    // ---- Helper Methods ----

    fn bump(counter: &Cell<usize>) {
        counter.set(counter.get() + 1);
    }

    /// `(value, gradient)` at `x` from the cache or one fresh combined call.
    fn combined_at(&self, fg: &CombinedFn, x: &Point) -> NlpResult<(Cost, Grad)> {
        if let Some(hit) = self.cache.borrow().as_ref().filter(|c| c.x == *x) {
            log::debug!("combined evaluation cache hit");
            return Ok((hit.value, hit.grad.clone()));
        }
        log::debug!("combined evaluation cache miss");
        Self::bump(&self.nfev);
        let (value, grad) = fg(x, &self.args)?;
        validate_grad(&grad, self.n)?;
        self.cache.replace(Some(CachedEval { x: x.clone(), value, grad: grad.clone() }));
        Ok((value, grad))
    }

    fn expected_arity(&self, index: usize) -> Option<usize> {
        self.arities.get().and_then(|a| a.get(index).copied())
    }

    fn eval_constraint(
        &self, index: usize, spec: &ConstraintSpec, x: &Point,
    ) -> NlpResult<ConstraintValues> {
        let values = spec.eval(x)?;
        if let Some(expected) = self.expected_arity(index) {
            validate_arity(values.len(), index, expected)?;
        }
        Ok(values)
    }

    fn jacobian_block(
        &self, index: usize, spec: &ConstraintSpec, x: &Point,
    ) -> NlpResult<Jacobian> {
        let block = match &spec.jac {
            Some(jac) => jac(x, &spec.args)?,
            None => {
                forward_diff_jacobian(|p| self.eval_constraint(index, spec, p), x, self.fd_step)?
            }
        };
        let rows = self.expected_arity(index).unwrap_or(block.nrows());
        validate_jacobian_block(&block, index, rows, self.n)?;
        Ok(block)
    }
}

impl NlpProblem for ProblemAdapter {
    fn objective(&self, x: &Point) -> NlpResult<Cost> {
        match &self.evaluator {
            Evaluator::Combined(fg) => Ok(self.combined_at(fg, x)?.0),
            Evaluator::Approximate(f) | Evaluator::Separate(f, _) => {
                Self::bump(&self.nfev);
                f(x, &self.args)
            }
        }
    }

    fn gradient(&self, x: &Point) -> NlpResult<Grad> {
        match &self.evaluator {
            Evaluator::Combined(fg) => Ok(self.combined_at(fg, x)?.1),
            Evaluator::Separate(_, g) => {
                Self::bump(&self.njev);
                let grad = g(x, &self.args)?;
                validate_grad(&grad, self.n)?;
                Ok(grad)
            }
            Evaluator::Approximate(f) => {
                Self::bump(&self.njev);
                forward_diff_gradient(|p| f(p, &self.args), x, self.fd_step)
            }
        }
    }

    fn constraints(&self, x: &Point) -> NlpResult<ConstraintValues> {
        let mut stacked = Vec::new();
        for (index, spec) in self.constraints.iter().enumerate() {
            stacked.extend(self.eval_constraint(index, spec, x)?.iter().copied());
        }
        Ok(ConstraintValues::from(stacked))
    }

    fn jacobian(&self, x: &Point) -> NlpResult<Jacobian> {
        let blocks = self
            .constraints
            .iter()
            .enumerate()
            .map(|(index, spec)| self.jacobian_block(index, spec, x))
            .collect::<NlpResult<Vec<_>>>()?;
        let rows = blocks.iter().map(|b| b.nrows()).sum();
        let mut jac = Jacobian::zeros((rows, self.n));
        let mut row = 0;
        for block in &blocks {
            jac.slice_mut(s![row..row + block.nrows(), ..]).assign(block);
            row += block.nrows();
        }
        Ok(jac)
    }

    fn intermediate(&self, report: &IterationReport) -> bool {
        self.nit.set(report.iter_count);
        true
    }
}
