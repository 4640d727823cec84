//! Validation helpers for the NLP adapter.
//!
//! This module centralizes the consistency checks used when a run is set
//! up and when user callbacks hand values back:
//!
//! - **Tolerance / step checks**: [`verify_tol`], [`verify_step`] ensure
//!   caller-supplied numbers are finite and strictly positive; a zero
//!   tolerance counts as "not supplied".
//! - **Gradient validation**: [`validate_grad`] enforces the variable
//!   dimension.
//! - **Jacobian validation**: [`validate_jacobian_block`] enforces the
//!   `(m_i, n)` shape of one constraint's Jacobian.
//! - **Arity validation**: [`validate_arity`] checks a constraint keeps the
//!   output length it had at the probe point.
//!
//! Only shapes are checked on callback output; values (including NaN) are
//! passed to the solver as returned.
use crate::optimization::{
    errors::{NlpError, NlpResult},
    nlp_adapter::types::{Grad, Jacobian},
};

/// Validate the optional caller tolerance and return the one in effect.
///
/// `Some(0.0)` is treated like `None`, so the default tolerance applies.
///
/// # Errors
/// Returns [`NlpError::InvalidTolerance`] if the value is non-finite or < 0.0.
pub fn verify_tol(tol: Option<f64>) -> NlpResult<Option<f64>> {
    match tol {
        Some(t) if t == 0.0 => Ok(None),
        Some(t) if !t.is_finite() => {
            Err(NlpError::InvalidTolerance { tol: t, reason: "Tolerance must be finite." })
        }
        Some(t) if t < 0.0 => {
            Err(NlpError::InvalidTolerance { tol: t, reason: "Tolerance must be positive." })
        }
        other => Ok(other),
    }
}

/// Validate a finite-difference step.
///
/// # Errors
/// Returns [`NlpError::InvalidStep`] if the step is non-finite or ≤ 0.0.
pub fn verify_step(step: f64) -> NlpResult<()> {
    if !step.is_finite() || step <= 0.0 {
        return Err(NlpError::InvalidStep { step });
    }
    Ok(())
}

/// Validate a gradient vector against the variable dimension.
///
/// # Errors
/// [`NlpError::GradientDimMismatch`] if `grad.len() != dim`.
pub fn validate_grad(grad: &Grad, dim: usize) -> NlpResult<()> {
    if grad.len() != dim {
        return Err(NlpError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    Ok(())
}

/// Validate the Jacobian block of constraint `index`.
///
/// # Errors
/// [`NlpError::JacobianShapeMismatch`] if the block is not `rows × cols`.
pub fn validate_jacobian_block(
    block: &Jacobian, index: usize, rows: usize, cols: usize,
) -> NlpResult<()> {
    if block.nrows() != rows || block.ncols() != cols {
        return Err(NlpError::JacobianShapeMismatch {
            constraint: index,
            expected: (rows, cols),
            found: (block.nrows(), block.ncols()),
        });
    }
    Ok(())
}

/// Validate that constraint `index` still returns `expected` values.
///
/// # Errors
/// [`NlpError::ConstraintArityChanged`] on a length change.
pub fn validate_arity(found: usize, index: usize, expected: usize) -> NlpResult<()> {
    if found != expected {
        return Err(NlpError::ConstraintArityChanged { constraint: index, expected, found });
    }
    Ok(())
}
