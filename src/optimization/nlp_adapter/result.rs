//! nlp_adapter::result — initial points, solutions, and the result record.
//!
//! Purpose
//! -------
//! Package a finished solver run into a uniform [`OptimizeResult`]:
//! solution, success flag, status code and message, final objective, the
//! raw [`SolverInfo`] payload, and the adapter's evaluation counters.
//!
//! Key behaviors
//! -------------
//! - `success` is exactly `status == 0`; any other status is a normal
//!   unsuccessful outcome, not an error.
//! - A scalar [`InitialPoint`] yields a scalar [`Solution`], so the rank of
//!   the caller's starting point is preserved even though the solver always
//!   works on a 1-D vector.
use crate::optimization::nlp_adapter::{adapter::EvalCounters, traits::SolverInfo, types::Point};

/// Starting point of a run: a bare scalar or a vector.
#[derive(Debug, Clone, PartialEq)]
pub enum InitialPoint {
    Scalar(f64),
    Vector(Point),
}

impl InitialPoint {
    /// At-least-1-D view: a scalar becomes a length-1 vector.
    pub fn to_point(&self) -> Point {
        match self {
            InitialPoint::Scalar(v) => Point::from(vec![*v]),
            InitialPoint::Vector(x) => x.clone(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, InitialPoint::Scalar(_))
    }
}

impl From<f64> for InitialPoint {
    fn from(value: f64) -> Self {
        InitialPoint::Scalar(value)
    }
}

impl From<Vec<f64>> for InitialPoint {
    fn from(values: Vec<f64>) -> Self {
        InitialPoint::Vector(Point::from(values))
    }
}

impl From<Point> for InitialPoint {
    fn from(point: Point) -> Self {
        InitialPoint::Vector(point)
    }
}

/// Final solution, with the same rank as the initial point.
#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
    Scalar(f64),
    Vector(Point),
}

impl Solution {
    pub fn len(&self) -> usize {
        match self {
            Solution::Scalar(_) => 1,
            Solution::Vector(x) => x.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Solution as a vector; a scalar becomes a length-1 vector.
    pub fn as_vector(&self) -> Point {
        match self {
            Solution::Scalar(v) => Point::from(vec![*v]),
            Solution::Vector(x) => x.clone(),
        }
    }

    /// `Some` only for scalar solutions.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Solution::Scalar(v) => Some(*v),
            Solution::Vector(_) => None,
        }
    }
}

/// Uniform result of one `minimize` call.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeResult {
    pub x: Solution,
    pub success: bool,
    pub status: i32,
    pub message: String,
    pub fun: f64,
    pub info: SolverInfo,
    pub nfev: usize,
    pub njev: usize,
    pub nit: usize,
}

impl OptimizeResult {
    /// Assemble the record from the solver's output and the run counters.
    ///
    /// `x` is the solver's final vector; it is unwrapped to a scalar when
    /// `x0` was a scalar.
    pub fn assemble(x0: &InitialPoint, x: Point, info: SolverInfo, counters: EvalCounters) -> Self {
        let solution = match (x0, x.len()) {
            (InitialPoint::Scalar(_), 1) => Solution::Scalar(x[0]),
            _ => Solution::Vector(x),
        };
        Self {
            x: solution,
            success: info.status == 0,
            status: info.status,
            message: info.status_msg.clone(),
            fun: info.obj_val,
            info,
            nfev: counters.nfev,
            njev: counters.njev,
            nit: counters.nit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Success mapping from the raw status code.
    // - Rank symmetry between initial point and solution.
    // - Counter and payload pass-through.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // A scalar start gives a scalar solution; status 0 means success.
    //
    // Given
    // -----
    // - `x0 = 3.0`, solver output `[1.5]`, status 0.
    //
    // Expect
    // ------
    // - `Solution::Scalar(1.5)`, `success == true`, counters copied.
    fn scalar_start_unwraps_solution() {
        // Arrange
        let x0 = InitialPoint::from(3.0);
        let info = SolverInfo::new(0, "Solve_Succeeded", 0.25, array![1.5]);
        let counters = EvalCounters { nfev: 4, njev: 2, nit: 3 };

        // Act
        let result = OptimizeResult::assemble(&x0, array![1.5], info, counters);

        // Assert
        assert_eq!(x0.to_point(), array![3.0]);
        assert_eq!(result.x, Solution::Scalar(1.5));
        assert_eq!(result.x.as_scalar(), Some(1.5));
        assert!(result.success);
        assert_eq!((result.nfev, result.njev, result.nit), (4, 2, 3));
        assert_eq!(result.fun, 0.25);
    }

    #[test]
    // Purpose
    // -------
    // A nonzero status is an unsuccessful result that keeps the solver's
    // code and message.
    fn nonzero_status_is_not_success() {
        let x0 = InitialPoint::from(vec![0.0, 0.0]);
        let info = SolverInfo::new(2, "Infeasible_Problem_Detected", 8.0, array![1.0, 2.0]);

        let result = OptimizeResult::assemble(&x0, array![1.0, 2.0], info, EvalCounters::default());

        assert!(!result.success);
        assert_eq!(result.status, 2);
        assert_eq!(result.message, "Infeasible_Problem_Detected");
        assert_eq!(result.x.len(), 2);
        assert_eq!(result.x.as_vector(), array![1.0, 2.0]);
        assert_eq!(result.x.as_scalar(), None);
    }
}
