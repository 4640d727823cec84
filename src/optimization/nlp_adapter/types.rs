//! nlp_adapter::types — shared numeric aliases and constants.
//!
//! Purpose
//! -------
//! Centralize the numeric shapes exchanged between the adapter, the user
//! callbacks, and solver backends so that the rest of the code stays
//! agnostic to `ndarray` generics.
//!
//! Conventions
//! -----------
//! - Every vector is an `Array1<f64>`; scalar starting points are lifted to
//!   length-1 vectors before they reach a solver.
//! - Jacobians are dense, row-major in the sense of "one row per constraint
//!   component, one column per variable".
use ndarray::{Array1, Array2};

/// Variable vector `x` handed to every callback.
pub type Point = Array1<f64>;

/// Gradient of the objective, same length as [`Point`].
pub type Grad = Array1<f64>;

/// Stacked constraint values `g(x)`.
pub type ConstraintValues = Array1<f64>;

/// Dense constraint Jacobian, `sum(m_i) × n`.
pub type Jacobian = Array2<f64>;

/// Scalar objective value.
pub type Cost = f64;

/// Finite stand-in for an unbounded constraint or variable bound.
///
/// Interior-point solvers treat any bound with magnitude at or above this
/// value as absent.
pub const INF_SENTINEL: f64 = 1e19;

/// Default forward-difference step.
pub const DEFAULT_FD_STEP: f64 = 1e-8;

/// Default convergence tolerance forwarded as the `tol` option.
pub const DEFAULT_TOL: f64 = 1e-8;
