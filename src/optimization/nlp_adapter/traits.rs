//! nlp_adapter::traits — the contract between the adapter and a solver.
//!
//! Purpose
//! -------
//! Describe the two sides of the solver boundary:
//! - [`NlpProblem`]: the five operations a solver may call on the problem
//!   object (objective, gradient, stacked constraints, stacked Jacobian,
//!   per-iteration callback).
//! - [`SolverBackend`] / [`NlpSolver`]: how a solver is constructed from
//!   `(n, m, problem, bounds)`, configured one option at a time, and run
//!   from an initial point.
//!
//! Invariants & assumptions
//! ------------------------
//! - A solver calls the problem operations sequentially; no operation is
//!   reentered while another is running.
//! - Problem operations take `&self`. Implementations that keep run-scoped
//!   state (caches, counters) use interior mutability and are therefore not
//!   `Sync`; one problem object serves exactly one run.
//! - Errors returned by problem operations are propagated by the solver
//!   unchanged and end the run.
use crate::optimization::{
    errors::NlpResult,
    nlp_adapter::{
        options::OptionValue,
        types::{ConstraintValues, Cost, Grad, Jacobian, Point},
    },
};

/// Diagnostics reported by a solver after each iteration.
///
/// Field names follow the interior-point convention: primal/dual
/// infeasibility, barrier parameter, step norms, and line-search trials.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IterationReport {
    pub alg_mod: i32,
    pub iter_count: usize,
    pub obj_value: f64,
    pub inf_pr: f64,
    pub inf_du: f64,
    pub mu: f64,
    pub d_norm: f64,
    pub regularization_size: f64,
    pub alpha_du: f64,
    pub alpha_pr: f64,
    pub ls_trials: usize,
}

/// Problem object consumed by a solver.
pub trait NlpProblem {
    /// Objective value at `x`.
    fn objective(&self, x: &Point) -> NlpResult<Cost>;

    /// Objective gradient at `x`, length `n`.
    fn gradient(&self, x: &Point) -> NlpResult<Grad>;

    /// All constraint values at `x`, stacked in constraint-list order.
    fn constraints(&self, x: &Point) -> NlpResult<ConstraintValues>;

    /// All constraint Jacobians at `x`, stacked row-wise in the same order.
    fn jacobian(&self, x: &Point) -> NlpResult<Jacobian>;

    /// Per-iteration callback. Returning `false` asks the solver to stop.
    fn intermediate(&self, report: &IterationReport) -> bool;
}

/// Bound vectors handed to a solver at construction.
///
/// `None` variable bounds mean "unbounded"; constraint bounds always have
/// length `m` (possibly zero).
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemBounds {
    pub x_lower: Option<Point>,
    pub x_upper: Option<Point>,
    pub g_lower: Point,
    pub g_upper: Point,
}

/// Raw termination payload returned by a solver.
///
/// `status`, `status_msg`, and `obj_val` are always meaningful; the
/// remaining vectors carry the final iterate, constraint values, and
/// multipliers when the backend provides them (empty otherwise).
#[derive(Debug, Clone, PartialEq)]
pub struct SolverInfo {
    pub status: i32,
    pub status_msg: String,
    pub obj_val: f64,
    pub x: Point,
    pub g: ConstraintValues,
    pub mult_g: Point,
    pub mult_x_l: Point,
    pub mult_x_u: Point,
}

impl SolverInfo {
    /// Payload with only the mandatory fields filled in.
    pub fn new(status: i32, status_msg: impl Into<String>, obj_val: f64, x: Point) -> Self {
        Self {
            status,
            status_msg: status_msg.into(),
            obj_val,
            x,
            g: Point::zeros(0),
            mult_g: Point::zeros(0),
            mult_x_l: Point::zeros(0),
            mult_x_u: Point::zeros(0),
        }
    }
}

/// A constructed solver bound to one problem object.
pub trait NlpSolver {
    /// Apply one option. `Err` carries the solver's rejection message.
    fn add_option(&mut self, name: &str, value: &OptionValue) -> Result<(), String>;

    /// Run from `x0` and return the final iterate plus the info payload.
    ///
    /// # Errors
    /// Evaluation errors raised by the problem object, unchanged.
    fn solve(&mut self, x0: &Point) -> NlpResult<(Point, SolverInfo)>;
}

/// Factory for solvers: the constructor side of the solver boundary.
pub trait SolverBackend {
    /// Construct a solver for an `n`-variable, `m`-constraint problem.
    fn create<'p>(
        &self, n: usize, m: usize, problem: &'p dyn NlpProblem, bounds: ProblemBounds,
    ) -> NlpResult<Box<dyn NlpSolver + 'p>>;
}
