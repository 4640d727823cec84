//! optimization — NLP adapter, built-in backends, and unified error surface.
//!
//! Purpose
//! -------
//! Provide a cohesive layer for solving constrained nonlinear programs:
//! callers describe an objective, optional derivatives, constraints, and
//! bounds once, and run them against any solver that implements the
//! adapter's backend contract.
//!
//! Key behaviors
//! -------------
//! - Expose the problem adapter and the `minimize` entry point
//!   (`nlp_adapter`), including option translation and result assembly.
//! - Ship a pure-Rust augmented-Lagrangian backend (`backends`) built on
//!   argmin's L-BFGS, so requests run without a native solver.
//! - Normalize configuration issues, shape violations, user callback
//!   failures, and backend errors into a single enum (`errors::NlpError`)
//!   with a common result alias (`NlpResult<T>`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Configuration errors are reported before a solver is constructed;
//!   nothing in this module panics on bad input.
//! - Solver non-convergence is an outcome (`success == false`), never an
//!   error.
//!
//! Conventions
//! -----------
//! - Points, gradients, and Jacobians are `ndarray` containers over `f64`
//!   (`Point`, `Grad`, `Jacobian`).
//! - Diagnostics go through the `log` facade; nothing here writes to
//!   stdout or stderr directly.
//!
//! Downstream usage
//! ----------------
//! - Front-ends typically import the curated surface via
//!   `optimization::prelude::*`, which forwards the adapter prelude, the
//!   built-in backend, and the core error types.
//!
//! Testing notes
//! -------------
//! - Unit tests in the submodules focus on local concerns (caching and
//!   counters, bound and option translation, merit function, outer loop).
//! - Integration tests run complete `minimize` calls end to end.

pub mod backends;
pub mod errors;
pub mod nlp_adapter;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_nlp::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::backends::AugmentedLagrangian;
    pub use super::errors::{NlpError, NlpResult};
    pub use super::nlp_adapter::prelude::*;
}
