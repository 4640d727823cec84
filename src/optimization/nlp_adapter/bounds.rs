//! nlp_adapter::bounds — translate bounds into flat solver vectors.
//!
//! Purpose
//! -------
//! Convert per-variable `(lower, upper)` pairs into the two variable bound
//! vectors, and a [`ConstraintSet`] into the two bound vectors of the
//! stacked constraint vector.
//!
//! Key behaviors
//! -------------
//! - No variable bounds → `(None, None)`, meaning "no bound vectors".
//! - Infinite variable bounds map to `∓INF_SENTINEL`, since the solver
//!   cannot represent unbounded values.
//! - Constraint `i` contributes `m_i = len(c_i(x0))` rows: lower bounds are
//!   `0`; upper bounds are `0` for equalities and `INF_SENTINEL` for
//!   inequalities.
//!
//! Invariants & assumptions
//! ------------------------
//! - `x0` is used only to probe each constraint's arity; the probe calls are
//!   not counted as objective or gradient evaluations.
//! - Kind tags are parsed when a
//!   [`ConstraintSpec`](super::constraints::ConstraintSpec) is built, so an
//!   unknown tag never reaches this module.
//! - Row order matches [`ConstraintSet`] order, which is also the order used
//!   by the adapter's `constraints` and `jacobian`.
use crate::optimization::{
    errors::{NlpError, NlpResult},
    nlp_adapter::{
        constraints::{ConstraintKind, ConstraintSet},
        types::{INF_SENTINEL, Point},
    },
};

/// Split `(lower, upper)` pairs into two vectors of length `n`.
///
/// # Errors
/// - [`NlpError::BoundsLengthMismatch`] if `bounds.len() != n`.
/// - [`NlpError::InvalidBound`] if a pair has `lower > upper` or a NaN.
pub fn variable_bounds(
    bounds: Option<&[(f64, f64)]>, n: usize,
) -> NlpResult<(Option<Point>, Option<Point>)> {
    let Some(bounds) = bounds else {
        return Ok((None, None));
    };
    if bounds.len() != n {
        return Err(NlpError::BoundsLengthMismatch { expected: n, found: bounds.len() });
    }
    let mut lower = Point::zeros(n);
    let mut upper = Point::zeros(n);
    for (index, &(lo, hi)) in bounds.iter().enumerate() {
        if lo.is_nan() || hi.is_nan() || lo > hi {
            return Err(NlpError::InvalidBound { index, lower: lo, upper: hi });
        }
        lower[index] = lo.max(-INF_SENTINEL);
        upper[index] = hi.min(INF_SENTINEL);
    }
    Ok((Some(lower), Some(upper)))
}

/// Constraint bound vectors plus the arity of each constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintBounds {
    pub lower: Point,
    pub upper: Point,
    pub arities: Vec<usize>,
}

impl ConstraintBounds {
    /// Total number of stacked constraint rows.
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }
}

/// Bound vectors `(cl, cu)` for the stacked constraint vector.
///
/// # Errors
/// Any error raised by a constraint function at the probe point.
pub fn constraint_bounds(constraints: &ConstraintSet, x0: &Point) -> NlpResult<ConstraintBounds> {
    let mut cl = Vec::new();
    let mut cu = Vec::new();
    let mut arities = Vec::with_capacity(constraints.len());
    for spec in constraints {
        let m = spec.eval(x0)?.len();
        cl.extend(std::iter::repeat_n(0.0, m));
        let upper = match spec.kind {
            ConstraintKind::Equality => 0.0,
            ConstraintKind::Inequality => INF_SENTINEL,
        };
        cu.extend(std::iter::repeat_n(upper, m));
        arities.push(m);
    }
    Ok(ConstraintBounds { lower: Point::from(cl), upper: Point::from(cu), arities })
}
