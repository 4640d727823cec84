//! backends — built-in implementations of the solver boundary.
//!
//! Each backend implements
//! [`SolverBackend`](crate::optimization::nlp_adapter::SolverBackend) and
//! consumes the problem only through
//! [`NlpProblem`](crate::optimization::nlp_adapter::NlpProblem).
pub mod augmented_lagrangian;

pub use self::augmented_lagrangian::{AlSolver, AugmentedLagrangian, config::AlConfig};
