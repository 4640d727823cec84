//! nlp_adapter::finite_diff — forward-difference gradients and Jacobians.
//!
//! Purpose
//! -------
//! Synthesize first derivatives for callbacks that do not provide them: the
//! objective gradient when no analytic gradient is configured, and the
//! Jacobian of every constraint lacking its own `jac`.
//!
//! Key behaviors
//! -------------
//! - [`forward_diff_gradient`]: `g_j = (f(x + h e_j) - f(x)) / h`, using
//!   `n + 1` sequential evaluations of `f`.
//! - [`forward_diff_jacobian`]: the same scheme applied to a vector-valued
//!   function, one column per variable, result shape `(m, n)`.
//! - [`FdStep::Auto`] delegates to the `finitediff` crate (`forward_diff`
//!   and `forward_jacobian`), which picks `h = sqrt(f64::EPSILON)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Errors raised by the differentiated function are returned unchanged;
//!   the first error stops the remaining probes.
//! - The point passed in is never mutated; probes use a private copy.
use std::cell::{Cell, RefCell};

use finitediff::FiniteDiff;

use crate::optimization::{
    errors::{NlpError, NlpResult},
    nlp_adapter::{
        types::{ConstraintValues, DEFAULT_FD_STEP, Grad, Jacobian, Point},
        validation::verify_step,
    },
};

/// Step-size policy for forward differences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FdStep {
    /// Fixed absolute step `h`.
    Fixed(f64),
    /// `h = sqrt(f64::EPSILON)`, derivatives computed by `finitediff`.
    Auto,
}

impl Default for FdStep {
    fn default() -> Self {
        FdStep::Fixed(DEFAULT_FD_STEP)
    }
}

impl FdStep {
    /// # Errors
    /// [`NlpError::InvalidStep`] for a non-finite or non-positive fixed step.
    pub fn validate(&self) -> NlpResult<()> {
        match self {
            FdStep::Fixed(h) => verify_step(*h),
            FdStep::Auto => Ok(()),
        }
    }

    /// Absolute step used for Jacobian columns.
    pub fn size(&self) -> f64 {
        match self {
            FdStep::Fixed(h) => *h,
            FdStep::Auto => f64::EPSILON.sqrt(),
        }
    }
}

/// Forward-difference gradient of a scalar function at `x`.
///
/// # Errors
/// Any error returned by `f`, unchanged.
///
/// # Examples
/// ```rust
/// # use ndarray::array;
/// # use rust_nlp::optimization::nlp_adapter::finite_diff::{FdStep, forward_diff_gradient};
/// let f = |x: &ndarray::Array1<f64>| Ok(x.dot(x));
/// let grad = forward_diff_gradient(f, &array![1.0, 2.0], FdStep::Fixed(1e-6)).unwrap();
/// assert!((grad[0] - 2.0).abs() < 1e-4);
/// assert!((grad[1] - 4.0).abs() < 1e-4);
/// ```
pub fn forward_diff_gradient<F>(f: F, x: &Point, step: FdStep) -> NlpResult<Grad>
where
    F: Fn(&Point) -> NlpResult<f64>,
{
    match step {
        FdStep::Fixed(h) => fixed_step_gradient(&f, x, h),
        FdStep::Auto => auto_step_gradient(&f, x),
    }
}

/// Forward-difference Jacobian of a vector-valued function at `x`.
///
/// The output length observed at `x` fixes the row count; a probe that
/// returns a different length yields [`NlpError::ConstraintArityChanged`]
/// (reported against constraint index 0; the adapter checks arity with the
/// real index before this point is reached).
///
/// # Errors
/// Any error returned by `c`, unchanged.
pub fn forward_diff_jacobian<C>(c: C, x: &Point, step: FdStep) -> NlpResult<Jacobian>
where
    C: Fn(&Point) -> NlpResult<ConstraintValues>,
{
    match step {
        FdStep::Fixed(h) => fixed_step_jacobian(&c, x, h),
        FdStep::Auto => auto_step_jacobian(&c, x),
    }
}

// ---- Helper Methods ----

fn fixed_step_gradient<F>(f: &F, x: &Point, h: f64) -> NlpResult<Grad>
where
    F: Fn(&Point) -> NlpResult<f64>,
{
    let f0 = f(x)?;
    let mut grad = Grad::zeros(x.len());
    let mut probe = x.clone();
    for j in 0..x.len() {
        let xj = probe[j];
        probe[j] = xj + h;
        let fj = f(&probe)?;
        probe[j] = xj;
        grad[j] = (fj - f0) / h;
    }
    Ok(grad)
}

fn fixed_step_jacobian<C>(c: &C, x: &Point, h: f64) -> NlpResult<Jacobian>
where
    C: Fn(&Point) -> NlpResult<ConstraintValues>,
{
    let c0 = c(x)?;
    let mut jac = Jacobian::zeros((c0.len(), x.len()));
    let mut probe = x.clone();
    for j in 0..x.len() {
        let xj = probe[j];
        probe[j] = xj + h;
        let cj = c(&probe)?;
        probe[j] = xj;
        if cj.len() != c0.len() {
            return Err(arity_changed(c0.len(), cj.len()));
        }
        jac.column_mut(j).assign(&((cj - &c0) / h));
    }
    Ok(jac)
}

/// `finitediff` wants an infallible `Fn(&Point) -> f64`, so the first error
/// is parked in `closure_err`, later probes short-circuit to NaN, and the
/// parked error is returned after the sweep.
fn auto_step_gradient<F>(f: &F, x: &Point) -> NlpResult<Grad>
where
    F: Fn(&Point) -> NlpResult<f64>,
{
    let closure_err: RefCell<Option<NlpError>> = RefCell::new(None);
    let wrapped = |p: &Point| -> f64 {
        if closure_err.borrow().is_some() {
            return f64::NAN;
        }
        match f(p) {
            Ok(value) => value,
            Err(e) => {
                closure_err.replace(Some(e));
                f64::NAN
            }
        }
    };
    let grad = x.forward_diff(&wrapped);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    Ok(grad)
}

/// Same error parking as [`auto_step_gradient`]. `finitediff` indexes every
/// probe by the length of the first output, so failed or resized probes
/// return a NaN vector of that length; an unknown length (first call
/// failed) is reported as 0 and no probe output is indexed.
fn auto_step_jacobian<C>(c: &C, x: &Point) -> NlpResult<Jacobian>
where
    C: Fn(&Point) -> NlpResult<ConstraintValues>,
{
    let closure_err: RefCell<Option<NlpError>> = RefCell::new(None);
    let arity: Cell<Option<usize>> = Cell::new(None);
    let wrapped = |p: &Point| -> ConstraintValues {
        let rows = arity.get().unwrap_or(0);
        if closure_err.borrow().is_some() {
            return ConstraintValues::from_elem(rows, f64::NAN);
        }
        match c(p) {
            Ok(values) => match arity.get() {
                None => {
                    arity.set(Some(values.len()));
                    values
                }
                Some(rows) if rows == values.len() => values,
                Some(rows) => {
                    closure_err.replace(Some(arity_changed(rows, values.len())));
                    ConstraintValues::from_elem(rows, f64::NAN)
                }
            },
            Err(e) => {
                closure_err.replace(Some(e));
                ConstraintValues::from_elem(rows, f64::NAN)
            }
        }
    };
    // `finitediff` lays the Jacobian out as (variables, outputs).
    let jac = x.forward_jacobian(&wrapped).reversed_axes();
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    Ok(jac)
}

fn arity_changed(expected: usize, found: usize) -> NlpError {
    NlpError::ConstraintArityChanged { constraint: 0, expected, found }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, array};
    use std::cell::Cell;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Accuracy of fixed-step and automatic-step forward differences.
    // - Evaluation counts of the forward scheme.
    // - Error propagation from the differentiated function.
    // - Jacobian orientation (one row per output, one column per variable).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // A quadratic's forward-difference gradient matches the analytic one.
    //
    // Given
    // -----
    // - `f(x) = (x0 - 1)^2 + (x1 - 2.5)^2` at `x = (0, 0)`.
    //
    // Expect
    // ------
    // - Gradient ≈ `(-2, -5)` within 1e-6 for both step policies.
    // - Exactly `n + 1 = 3` evaluations on the fixed-step path.
    fn quadratic_gradient_matches_analytic() {
        // Arrange
        let calls = Cell::new(0usize);
        let f = |x: &Point| -> NlpResult<f64> {
            calls.set(calls.get() + 1);
            Ok((x[0] - 1.0).powi(2) + (x[1] - 2.5).powi(2))
        };
        let x = array![0.0, 0.0];

        // Act
        let fixed = forward_diff_gradient(f, &x, FdStep::default()).expect("fixed step");
        let fixed_calls = calls.get();
        let auto = forward_diff_gradient(f, &x, FdStep::Auto).expect("auto step");

        // Assert
        assert_eq!(fixed_calls, 3);
        assert_abs_diff_eq!(fixed[0], -2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fixed[1], -5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(auto[0], -2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(auto[1], -5.0, epsilon = 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // The first error raised by `f` is returned unchanged and stops the
    // remaining probes on both paths.
    //
    // Given
    // -----
    // - An objective that fails whenever `x0 > 0`.
    //
    // Expect
    // ------
    // - `Err(NlpError::Evaluation { .. })` with the original text.
    fn evaluation_error_is_propagated_unchanged() {
        // Arrange
        let f = |x: &Point| -> NlpResult<f64> {
            if x[0] > 0.0 { Err(NlpError::evaluation("domain")) } else { Ok(x[0]) }
        };
        let x = array![0.0, 0.0];

        // Act
        let fixed = forward_diff_gradient(f, &x, FdStep::Fixed(1e-4));
        let auto = forward_diff_gradient(f, &x, FdStep::Auto);

        // Assert
        assert_eq!(fixed, Err(NlpError::evaluation("domain")));
        assert_eq!(auto, Err(NlpError::evaluation("domain")));
    }

    #[test]
    // Purpose
    // -------
    // Jacobians have one row per output and one column per variable.
    //
    // Given
    // -----
    // - `c(x) = (x0 + 2 x1, x0 * x1, 3 x2)` at `x = (1, 2, 3)`.
    //
    // Expect
    // ------
    // - Shape `(3, 3)` and entries close to
    //   `[[1, 2, 0], [2, 1, 0], [0, 0, 3]]`.
    fn jacobian_has_output_rows_and_variable_columns() {
        // Arrange
        let c = |x: &Point| -> NlpResult<ConstraintValues> {
            Ok(array![x[0] + 2.0 * x[1], x[0] * x[1], 3.0 * x[2]])
        };
        let x = array![1.0, 2.0, 3.0];
        let expected = array![[1.0, 2.0, 0.0], [2.0, 1.0, 0.0], [0.0, 0.0, 3.0]];

        // Act
        let jac = forward_diff_jacobian(c, &x, FdStep::default()).expect("jacobian");
        let auto = forward_diff_jacobian(c, &x, FdStep::Auto).expect("auto jacobian");

        // Assert
        assert_eq!(jac.dim(), (3, 3));
        assert_eq!(auto.dim(), (3, 3));
        for ((a, b), e) in jac.iter().zip(auto.iter()).zip(expected.iter()) {
            assert_abs_diff_eq!(*a, *e, epsilon = 1e-6);
            assert_abs_diff_eq!(*b, *e, epsilon = 1e-6);
        }
    }

    #[test]
    // Purpose
    // -------
    // A function whose output length changes between probes is reported
    // instead of panicking inside `ndarray` arithmetic.
    fn jacobian_reports_changing_arity() {
        // Arrange
        let c = |x: &Point| -> NlpResult<ConstraintValues> {
            if x[0] > 0.0 { Ok(Array1::zeros(2)) } else { Ok(Array1::zeros(1)) }
        };

        // Act
        let fixed = forward_diff_jacobian(c, &array![0.0], FdStep::default());
        let auto = forward_diff_jacobian(c, &array![0.0], FdStep::Auto);

        // Assert
        let changed = NlpError::ConstraintArityChanged { constraint: 0, expected: 1, found: 2 };
        assert_eq!(fixed, Err(changed.clone()));
        assert_eq!(auto, Err(changed));
    }

    #[test]
    // Purpose
    // -------
    // The automatic-step Jacobian uses `finitediff`'s step, has one row per
    // output even when outputs and variables differ in number, and returns
    // evaluation errors unchanged.
    //
    // Given
    // -----
    // - `c(x) = (x0 x1 x2, x0 - x2)` at `x = (1, 2, 3)`; a copy failing
    //   whenever `x1 > 2`.
    //
    // Expect
    // ------
    // - Shape `(2, 3)` with entries close to `[[6, 3, 2], [1, 0, -1]]`.
    // - `Err(Evaluation("domain"))` from the failing copy.
    fn auto_jacobian_is_oriented_and_propagates_errors() {
        // Arrange
        let c = |x: &Point| -> NlpResult<ConstraintValues> {
            Ok(array![x[0] * x[1] * x[2], x[0] - x[2]])
        };
        let failing = |x: &Point| -> NlpResult<ConstraintValues> {
            if x[1] > 2.0 { Err(NlpError::evaluation("domain")) } else { c(x) }
        };
        let x = array![1.0, 2.0, 3.0];
        let expected = array![[6.0, 3.0, 2.0], [1.0, 0.0, -1.0]];

        // Act
        let jac = forward_diff_jacobian(c, &x, FdStep::Auto).expect("auto jacobian");
        let err = forward_diff_jacobian(failing, &x, FdStep::Auto);

        // Assert
        assert_eq!(jac.dim(), (2, 3));
        for (a, e) in jac.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*a, *e, epsilon = 1e-6);
        }
        assert_eq!(err, Err(NlpError::evaluation("domain")));
    }

    #[test]
    fn fixed_step_must_be_positive() {
        assert!(FdStep::Fixed(0.0).validate().is_err());
        assert!(FdStep::Auto.validate().is_ok());
        assert_eq!(FdStep::default(), FdStep::Fixed(DEFAULT_FD_STEP));
    }
}
