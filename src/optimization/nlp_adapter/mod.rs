//! nlp_adapter — drive an interior-point style NLP solver from plain callbacks.
//!
//! Purpose
//! -------
//! Turn a generic problem description (objective, optional gradient,
//! equality/inequality constraints of any arity, variable bounds, options)
//! into the fixed calling convention of an NLP solver: one problem object
//! with five operations, flat bound vectors, and named options. Callers
//! build a [`Minimize`] request and run it against any [`SolverBackend`].
//!
//! Key behaviors
//! -------------
//! - [`adapter::ProblemAdapter`] exposes objective, gradient, stacked
//!   constraints, stacked Jacobian, and the iteration callback, memoizing
//!   combined `(value, gradient)` evaluations per point.
//! - [`finite_diff`] synthesizes the objective gradient and constraint
//!   Jacobians when they are not supplied.
//! - [`bounds`] flattens per-variable bounds and per-constraint kinds into
//!   the four bound vectors a solver is built with.
//! - [`options`] maps generic option names (`disp`, `maxiter`) onto solver
//!   names and injects defaults before applying them one at a time.
//! - [`result`] assembles a uniform [`OptimizeResult`] with `success`
//!   defined as `status == 0`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every run gets a fresh adapter; caches and counters never outlive one
//!   `minimize` call.
//! - Configuration mistakes fail before the solver is constructed; errors
//!   raised by user callbacks during the solve propagate unchanged.
//! - Internally every point is a 1-D [`Point`]; a scalar starting point is
//!   unwrapped back to a scalar solution.
//!
//! Downstream usage
//! ----------------
//! - Most callers only need the prelude:
//!   [`Minimize`], [`Objective`], [`GradientSpec`], [`ConstraintSpec`],
//!   [`Args`], [`SolverOptions`], and [`OptimizeResult`].
//! - Solver integrations implement [`SolverBackend`] / [`NlpSolver`] and
//!   consume the problem only through [`NlpProblem`].
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each submodule.
//! - `tests/integration_minimize.rs` runs end-to-end problems through the
//!   built-in augmented-Lagrangian backend and a recording mock backend.

pub mod adapter;
pub mod api;
pub mod args;
pub mod bounds;
pub mod constraints;
pub mod finite_diff;
pub mod objective;
pub mod options;
pub mod result;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::adapter::{EvalCounters, ProblemAdapter};
pub use self::api::{Minimize, minimize};
pub use self::args::{ArgValue, Args};
pub use self::constraints::{ConstraintKind, ConstraintSet, ConstraintSpec};
pub use self::finite_diff::FdStep;
pub use self::objective::{GradientSpec, Objective};
pub use self::options::{OptionValue, SolverOptions};
pub use self::result::{InitialPoint, OptimizeResult, Solution};
pub use self::traits::{
    IterationReport, NlpProblem, NlpSolver, ProblemBounds, SolverBackend, SolverInfo,
};
pub use self::types::{ConstraintValues, Cost, Grad, INF_SENTINEL, Jacobian, Point};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_nlp::optimization::nlp_adapter::prelude::*;
//
// to import the main adapter surface in a single line.

pub mod prelude {
    pub use super::api::{Minimize, minimize};
    pub use super::args::Args;
    pub use super::constraints::ConstraintSpec;
    pub use super::objective::{GradientSpec, Objective};
    pub use super::options::SolverOptions;
    pub use super::result::{OptimizeResult, Solution};
    pub use super::types::{Grad, Jacobian, Point};
}
