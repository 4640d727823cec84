//! errors — unified error surface for the NLP adapter and its backends.
//!
//! Purpose
//! -------
//! Collect every failure the adapter layer can report into one enum,
//! [`NlpError`], with a shared result alias [`NlpResult`]. Configuration
//! mistakes, shape violations, user evaluation failures, and backend
//! (Argmin) errors all surface through the same type.
//!
//! Conventions
//! -----------
//! - Configuration errors are raised before any solver iteration and carry
//!   the offending name/value.
//! - Errors produced by user callbacks are never rewritten: whatever
//!   [`NlpError`] a callback returns is handed back to the caller as-is,
//!   including when it travels through Argmin's type-erased error.
use argmin::core::{ArgminError, Error};

/// Crate-wide result alias for adapter and solver operations.
pub type NlpResult<T> = Result<T, NlpError>;

#[derive(Debug, Clone, PartialEq)]
pub enum NlpError {
    // ---- Configuration ----
    /// Second-derivative information was requested (`hess` or `hessp`).
    UnsupportedFeature {
        feature: &'static str,
    },

    /// The objective form and the gradient specification do not pair up.
    InvalidGradientSpec {
        objective: &'static str,
        gradient: &'static str,
    },

    /// Constraint kind tag other than `"eq"` / `"ineq"`.
    InvalidConstraintKind {
        kind: String,
    },

    /// The solver rejected an option.
    InvalidSolverOption {
        name: String,
        value: String,
        message: String,
    },

    /// Tolerance needs to be positive and finite.
    InvalidTolerance {
        tol: f64,
        reason: &'static str,
    },

    /// Finite-difference step needs to be positive and finite.
    InvalidStep {
        step: f64,
    },

    /// Number of variable bound pairs does not match the dimension.
    BoundsLengthMismatch {
        expected: usize,
        found: usize,
    },

    /// A variable bound pair with `lower > upper` or a NaN entry.
    InvalidBound {
        index: usize,
        lower: f64,
        upper: f64,
    },

    /// Initial point has no entries.
    EmptyProblem,

    // ---- Extra arguments ----
    /// Positional or keyword argument not present.
    MissingArgument {
        name: String,
    },

    /// Argument present but holds a different kind of value.
    ArgumentType {
        name: String,
        expected: &'static str,
    },

    // ---- Shapes ----
    /// Gradient dimensions do not match the variable dimension.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Constraint Jacobian block has the wrong shape.
    JacobianShapeMismatch {
        constraint: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// A constraint returned a different number of values than at the probe point.
    ConstraintArityChanged {
        constraint: usize,
        expected: usize,
        found: usize,
    },

    // ---- User callbacks ----
    /// Generic failure raised from a user objective, gradient, or constraint.
    Evaluation {
        text: String,
    },

    // ---- Argmin ----
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter {
        text: String,
    },
    /// Wrapper for argmin::NotImplemented
    NotImplemented {
        text: String,
    },
    /// Wrapper for argmin::NotInitialized
    NotInitialized {
        text: String,
    },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated {
        text: String,
    },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound {
        text: String,
    },
    /// Wrapper for argmin::PotentialBug
    PotentialBug {
        text: String,
    },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError {
        text: String,
    },
    /// Wrapper for other argmin::Error types
    BackendError {
        text: String,
    },

    // ---- Fallback ----
    UnknownError,
}

impl NlpError {
    /// Convenience constructor for user callbacks.
    pub fn evaluation(text: impl Into<String>) -> Self {
        NlpError::Evaluation { text: text.into() }
    }

    /// `true` for errors that are raised while setting up a run.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            NlpError::UnsupportedFeature { .. }
                | NlpError::InvalidGradientSpec { .. }
                | NlpError::InvalidConstraintKind { .. }
                | NlpError::InvalidSolverOption { .. }
                | NlpError::InvalidTolerance { .. }
                | NlpError::InvalidStep { .. }
                | NlpError::BoundsLengthMismatch { .. }
                | NlpError::InvalidBound { .. }
                | NlpError::EmptyProblem
        )
    }
}

impl std::error::Error for NlpError {}

impl std::fmt::Display for NlpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Configuration ----
            NlpError::UnsupportedFeature { feature } => {
                write!(
                    f,
                    "Unsupported feature '{feature}': second-derivative information is not \
                     supported"
                )
            }
            NlpError::InvalidGradientSpec { objective, gradient } => {
                write!(
                    f,
                    "Invalid gradient specification: a {objective} objective cannot be paired \
                     with a {gradient} gradient"
                )
            }
            NlpError::InvalidConstraintKind { kind } => {
                write!(f, "Invalid constraint kind '{kind}': expected 'eq' or 'ineq'")
            }
            NlpError::InvalidSolverOption { name, value, message } => {
                write!(
                    f,
                    "Invalid solver option: {name}: {value} (Original message: \"{message}\")"
                )
            }
            NlpError::InvalidTolerance { tol, reason } => {
                write!(f, "Invalid tolerance {tol}: {reason}")
            }
            NlpError::InvalidStep { step } => {
                write!(f, "Invalid finite-difference step {step}: must be finite and > 0")
            }
            NlpError::BoundsLengthMismatch { expected, found } => {
                write!(f, "Bounds length mismatch: expected {expected} pairs, found {found}")
            }
            NlpError::InvalidBound { index, lower, upper } => {
                write!(f, "Invalid bound for variable {index}: lower {lower} exceeds upper {upper}")
            }
            NlpError::EmptyProblem => {
                write!(f, "Initial point must have at least one entry")
            }

            // ---- Extra arguments ----
            NlpError::MissingArgument { name } => {
                write!(f, "Missing argument '{name}'")
            }
            NlpError::ArgumentType { name, expected } => {
                write!(f, "Argument '{name}' is not a {expected}")
            }

            // ---- Shapes ----
            NlpError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            NlpError::JacobianShapeMismatch { constraint, expected, found } => {
                write!(
                    f,
                    "Jacobian of constraint {constraint} has shape {found:?}, expected {expected:?}"
                )
            }
            NlpError::ConstraintArityChanged { constraint, expected, found } => {
                write!(
                    f,
                    "Constraint {constraint} returned {found} values, expected {expected} as at \
                     the initial point"
                )
            }

            // ---- User callbacks ----
            NlpError::Evaluation { text } => {
                write!(f, "Evaluation failed: {text}")
            }

            // ---- Argmin ----
            NlpError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            NlpError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            NlpError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            NlpError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            NlpError::CheckPointNotFound { text } => {
                write!(f, "Checkpoint not found: {text}")
            }
            NlpError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            NlpError::ImpossibleError { text } => {
                write!(f, "Impossible error: {text}")
            }
            NlpError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }

            // ---- Fallback ----
            NlpError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

impl From<Error> for NlpError {
    fn from(original_err: Error) -> Self {
        let original_err = match original_err.downcast::<NlpError>() {
            Ok(nlp_err) => return nlp_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(opt_err) => match opt_err {
                ArgminError::InvalidParameter { text } => NlpError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => NlpError::NotImplemented { text },
                ArgminError::NotInitialized { text } => NlpError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => NlpError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => NlpError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => NlpError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => NlpError::ImpossibleError { text },
                _ => NlpError::UnknownError,
            },
            Err(err) => NlpError::BackendError { text: err.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Round-tripping an `NlpError` through Argmin's type-erased error.
    // - Mapping of `ArgminError` variants and foreign errors.
    // - Display text for configuration errors that callers act on.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // A user error that travels through `argmin::core::Error` must come back
    // unchanged.
    //
    // Given
    // -----
    // - `NlpError::Evaluation` converted into an Argmin error.
    //
    // Expect
    // ------
    // - Converting back yields the identical variant and text.
    fn user_error_survives_argmin_round_trip() {
        // Arrange
        let original = NlpError::evaluation("objective blew up");
        let erased: Error = original.clone().into();

        // Act
        let recovered = NlpError::from(erased);

        // Assert
        assert_eq!(recovered, original);
    }

    #[test]
    // Purpose
    // -------
    // Argmin's own error kinds map onto the wrapper variants.
    //
    // Given
    // -----
    // - `ArgminError::InvalidParameter` with a message.
    //
    // Expect
    // ------
    // - `NlpError::InvalidParameter` with the same message.
    fn argmin_error_maps_to_wrapper_variant() {
        // Arrange
        let erased: Error = ArgminError::InvalidParameter { text: "bad".to_string() }.into();

        // Act
        let mapped = NlpError::from(erased);

        // Assert
        assert_eq!(mapped, NlpError::InvalidParameter { text: "bad".to_string() });
    }

    #[test]
    // Purpose
    // -------
    // Errors that are neither `NlpError` nor `ArgminError` become
    // `BackendError` carrying their display text.
    fn foreign_error_becomes_backend_error() {
        // Arrange
        let io = std::io::Error::other("disk on fire");
        let erased: Error = io.into();

        // Act
        let mapped = NlpError::from(erased);

        // Assert
        assert_eq!(mapped, NlpError::BackendError { text: "disk on fire".to_string() });
    }

    #[test]
    // Purpose
    // -------
    // The solver-option error names the option, the value, and the
    // rejection message.
    fn invalid_solver_option_display_carries_context() {
        // Arrange
        let err = NlpError::InvalidSolverOption {
            name: "max_iter".to_string(),
            value: "abc".to_string(),
            message: "expected an integer".to_string(),
        };

        // Act
        let text = err.to_string();

        // Assert
        assert!(text.contains("max_iter"));
        assert!(text.contains("abc"));
        assert!(text.contains("expected an integer"));
        assert!(err.is_configuration());
    }
}
