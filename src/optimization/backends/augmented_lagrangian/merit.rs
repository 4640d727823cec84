//! augmented_lagrangian::merit — PHR augmented Lagrangian as an argmin problem.
//!
//! Purpose
//! -------
//! Fold the objective, every constraint row, and every finite variable
//! bound into one smooth merit function that argmin's L-BFGS can minimize
//! for fixed multipliers `λ` and penalty `ρ`.
//!
//! Key behaviors
//! -------------
//! - Each finite side of a bound becomes a [`Term`] with value `s(x)`:
//!   - equality rows (`lower == upper`): `h = c - lower`, contributing
//!     `λ h + ρ/2 h²`;
//!   - inequality sides: `s = c - lower` or `s = upper - c`, required
//!     `s >= 0`, contributing `(max(0, λ - ρ s)² - λ²) / (2ρ)`.
//! - Variable bounds use the same inequality terms with `c = x_i`.
//! - Bounds whose magnitude reaches `INF_SENTINEL` are treated as absent.
//!
//! Invariants & assumptions
//! ------------------------
//! - `lambda.len() == layout.terms.len()` and `rho > 0`.
//! - The first problem error is parked in the caller's failure slot before
//!   it is handed to argmin. Line-search failures end an L-BFGS run with
//!   `Ok`, so the slot is the only reliable record of the error.
use std::cell::RefCell;

use argmin::core::{CostFunction, Error, Gradient};

use crate::optimization::{
    errors::{NlpError, NlpResult},
    nlp_adapter::{
        traits::{NlpProblem, ProblemBounds},
        types::{ConstraintValues, Cost, Grad, INF_SENTINEL, Jacobian, Point},
    },
};

/// What a term constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Row `j` of the stacked constraint vector.
    Constraint(usize),
    /// Variable `i`.
    Variable(usize),
}

/// One scalar condition `s(x) = 0` or `s(x) >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Term {
    pub source: Source,
    /// `+1` for a lower side (`v - offset`), `-1` for an upper side (`offset - v`).
    pub sign: f64,
    pub offset: f64,
    pub equality: bool,
}

impl Term {
    fn value(&self, v: f64) -> f64 {
        self.sign * (v - self.offset)
    }
}

/// Flattened list of terms built once per run from the bound vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct TermLayout {
    pub terms: Vec<Term>,
    pub n: usize,
    pub m: usize,
}

impl TermLayout {
    pub fn new(n: usize, bounds: &ProblemBounds) -> Self {
        let mut terms = Vec::new();
        for (j, (&lo, &hi)) in bounds.g_lower.iter().zip(bounds.g_upper.iter()).enumerate() {
            push_sides(&mut terms, Source::Constraint(j), lo, hi, true);
        }
        if let (Some(lower), Some(upper)) = (&bounds.x_lower, &bounds.x_upper) {
            for (i, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
                push_sides(&mut terms, Source::Variable(i), lo, hi, false);
            }
        }
        Self { terms, n, m: bounds.g_lower.len() }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Term values `s(x)` given `x` and the stacked constraint values.
    pub fn values(&self, x: &Point, c: &ConstraintValues) -> Vec<f64> {
        self.terms
            .iter()
            .map(|t| match t.source {
                Source::Constraint(j) => t.value(c[j]),
                Source::Variable(i) => t.value(x[i]),
            })
            .collect()
    }

    /// Largest violation: `|h|` for equalities, `max(0, -s)` for inequalities.
    pub fn violation(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .zip(values)
            .map(|(t, &s)| if t.equality { s.abs() } else { (-s).max(0.0) })
            .fold(0.0, f64::max)
    }

    /// First-order multiplier update after an inner solve.
    pub fn update_multipliers(&self, lambda: &mut [f64], values: &[f64], rho: f64) {
        for ((t, l), &s) in self.terms.iter().zip(lambda.iter_mut()).zip(values) {
            *l = if t.equality { *l + rho * s } else { (*l - rho * s).max(0.0) };
        }
    }

    /// Split multipliers into `(mult_g, mult_x_l, mult_x_u)`.
    ///
    /// Constraint multipliers follow the `∇f - Jᵀ mult_g` sign convention
    /// of the Lagrangian `f - Σ λ s`; upper-side multipliers are negated.
    pub fn split_multipliers(&self, lambda: &[f64]) -> (Point, Point, Point) {
        let mut mult_g = Point::zeros(self.m);
        let mut mult_x_l = Point::zeros(self.n);
        let mut mult_x_u = Point::zeros(self.n);
        for (t, &l) in self.terms.iter().zip(lambda) {
            match t.source {
                Source::Constraint(j) => mult_g[j] += t.sign * l,
                Source::Variable(i) if t.sign > 0.0 => mult_x_l[i] = l,
                Source::Variable(i) => mult_x_u[i] = l,
            }
        }
        (mult_g, mult_x_l, mult_x_u)
    }

    /// Project `x` onto the variable box.
    pub fn project(&self, x: &mut Point) {
        for t in self.terms.iter().filter(|t| !t.equality) {
            if let Source::Variable(i) = t.source {
                if t.value(x[i]) < 0.0 {
                    x[i] = t.offset;
                }
            }
        }
    }
}

/// Augmented Lagrangian for fixed `(λ, ρ)`.
pub struct AugmentedMerit<'a> {
    problem: &'a dyn NlpProblem,
    layout: &'a TermLayout,
    lambda: &'a [f64],
    rho: f64,
    failure: &'a RefCell<Option<NlpError>>,
}

impl<'a> AugmentedMerit<'a> {
    /// Merit for fixed `(λ, ρ)`.
    ///
    /// `failure` receives the first error raised by `problem`; later errors
    /// leave it untouched.
    pub fn new(
        problem: &'a dyn NlpProblem, layout: &'a TermLayout, lambda: &'a [f64], rho: f64,
        failure: &'a RefCell<Option<NlpError>>,
    ) -> Self {
        Self { problem, layout, lambda, rho, failure }
    }

    // ---- Helper Methods ----

    fn record<T>(&self, outcome: NlpResult<T>) -> Result<T, Error> {
        outcome.map_err(|err| {
            let mut slot = self.failure.borrow_mut();
            if slot.is_none() {
                *slot = Some(err.clone());
            }
            Error::new(err)
        })
    }

    fn constraint_values(&self, x: &Point) -> Result<ConstraintValues, Error> {
        if self.layout.m == 0 {
            return Ok(ConstraintValues::zeros(0));
        }
        self.record(self.problem.constraints(x))
    }

    fn constraint_jacobian(&self, x: &Point) -> Result<Jacobian, Error> {
        if self.layout.m == 0 {
            return Ok(Jacobian::zeros((0, self.layout.n)));
        }
        self.record(self.problem.jacobian(x))
    }
}

impl CostFunction for AugmentedMerit<'_> {
    type Param = Point;
    type Output = Cost;

    fn cost(&self, x: &Self::Param) -> Result<Self::Output, Error> {
        let f = self.record(self.problem.objective(x))?;
        let c = self.constraint_values(x)?;
        let values = self.layout.values(x, &c);
        let rho = self.rho;
        let penalty: f64 = self
            .layout
            .terms
            .iter()
            .zip(self.lambda)
            .zip(&values)
            .map(|((t, &l), &s)| {
                if t.equality {
                    l * s + 0.5 * rho * s * s
                } else {
                    ((l - rho * s).max(0.0).powi(2) - l * l) / (2.0 * rho)
                }
            })
            .sum();
        Ok(f + penalty)
    }
}

impl Gradient for AugmentedMerit<'_> {
    type Param = Point;
    type Gradient = Grad;

    /// `∇f + Σ w_k ∇s_k` with `w = λ + ρ h` (equality) or
    /// `w = -max(0, λ - ρ s)` (inequality).
    fn gradient(&self, x: &Self::Param) -> Result<Self::Gradient, Error> {
        let mut grad = self.record(self.problem.gradient(x))?;
        let c = self.constraint_values(x)?;
        let jac = self.constraint_jacobian(x)?;
        let values = self.layout.values(x, &c);
        for ((t, &l), &s) in self.layout.terms.iter().zip(self.lambda).zip(&values) {
            let weight = if t.equality { l + self.rho * s } else { -(l - self.rho * s).max(0.0) };
            if weight == 0.0 {
                continue;
            }
            match t.source {
                Source::Constraint(j) => grad.scaled_add(weight * t.sign, &jac.row(j)),
                Source::Variable(i) => grad[i] += weight * t.sign,
            }
        }
        Ok(grad)
    }
}

// ---- Helper Methods ----

fn push_sides(terms: &mut Vec<Term>, source: Source, lo: f64, hi: f64, allow_equality: bool) {
    let lo_finite = lo.abs() < INF_SENTINEL;
    let hi_finite = hi.abs() < INF_SENTINEL;
    if allow_equality && lo_finite && hi_finite && lo == hi {
        terms.push(Term { source, sign: 1.0, offset: lo, equality: true });
        return;
    }
    if lo_finite {
        terms.push(Term { source, sign: 1.0, offset: lo, equality: false });
    }
    if hi_finite {
        terms.push(Term { source, sign: -1.0, offset: hi, equality: false });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::nlp_adapter::traits::IterationReport;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Term layout from constraint and variable bound vectors.
    // - Merit value and gradient against hand-computed values.
    // - Multiplier updates, violation, and projection.
    // -------------------------------------------------------------------------

    /// `f = x0² + x1²`, `c = [x0 + x1]`.
    struct Toy;

    impl NlpProblem for Toy {
        fn objective(&self, x: &Point) -> NlpResult<Cost> {
            Ok(x.dot(x))
        }

        fn gradient(&self, x: &Point) -> NlpResult<Grad> {
            Ok(2.0 * x)
        }

        fn constraints(&self, x: &Point) -> NlpResult<ConstraintValues> {
            Ok(array![x[0] + x[1]])
        }

        fn jacobian(&self, _: &Point) -> NlpResult<Jacobian> {
            Ok(array![[1.0, 1.0]])
        }

        fn intermediate(&self, _: &IterationReport) -> bool {
            true
        }
    }

    fn toy_bounds(g_lower: f64, g_upper: f64) -> ProblemBounds {
        ProblemBounds {
            x_lower: Some(array![0.0, -INF_SENTINEL]),
            x_upper: Some(array![INF_SENTINEL, 3.0]),
            g_lower: array![g_lower],
            g_upper: array![g_upper],
        }
    }

    #[test]
    // Purpose
    // -------
    // Equal constraint bounds give one equality term; finite variable bound
    // sides give one inequality term each; infinite sides are skipped.
    fn layout_classifies_sides() {
        let layout = TermLayout::new(2, &toy_bounds(1.0, 1.0));

        assert_eq!(layout.len(), 3);
        assert_eq!(
            layout.terms[0],
            Term { source: Source::Constraint(0), sign: 1.0, offset: 1.0, equality: true }
        );
        assert_eq!(
            layout.terms[1],
            Term { source: Source::Variable(0), sign: 1.0, offset: 0.0, equality: false }
        );
        assert_eq!(
            layout.terms[2],
            Term { source: Source::Variable(1), sign: -1.0, offset: 3.0, equality: false }
        );
    }

    #[test]
    // Purpose
    // -------
    // Merit value and gradient match the PHR formulas.
    //
    // Given
    // -----
    // - Equality `x0 + x1 = 1` with `λ = 0.5`, `ρ = 2`; bounds `x0 >= 0`,
    //   `x1 <= 3` with zero multipliers; `x = (1, 1)`.
    //
    // Expect
    // ------
    // - `h = 1`: value `2 + 0.5 + 1 = 3.5`; gradient `(2, 2) + 2.5 (1, 1)`.
    // - Bound terms are inactive and contribute nothing.
    fn merit_matches_hand_computation() {
        // Arrange
        let layout = TermLayout::new(2, &toy_bounds(1.0, 1.0));
        let lambda = [0.5, 0.0, 0.0];
        let failure = RefCell::new(None);
        let merit = AugmentedMerit::new(&Toy, &layout, &lambda, 2.0, &failure);
        let x = array![1.0, 1.0];

        // Act
        let value = merit.cost(&x).expect("cost");
        let grad = merit.gradient(&x).expect("gradient");

        // Assert
        assert_abs_diff_eq!(value, 3.5, epsilon = 1e-12);
        assert_abs_diff_eq!(grad[0], 4.5, epsilon = 1e-12);
        assert_abs_diff_eq!(grad[1], 4.5, epsilon = 1e-12);
        assert!(failure.borrow().is_none());
    }

    #[test]
    // Purpose
    // -------
    // A violated inequality is penalized and pushes the gradient back
    // toward the feasible side.
    fn violated_inequality_penalizes() {
        // Arrange: x0 >= 0 violated at x0 = -1.
        let layout = TermLayout::new(2, &toy_bounds(-INF_SENTINEL, INF_SENTINEL));
        let lambda = [0.0, 0.0];
        let failure = RefCell::new(None);
        let merit = AugmentedMerit::new(&Toy, &layout, &lambda, 10.0, &failure);
        let x = array![-1.0, 0.0];

        // Act
        let value = merit.cost(&x).expect("cost");
        let grad = merit.gradient(&x).expect("gradient");

        // Assert: f = 1, penalty = (10)^2 / 20 = 5; d/dx0 = -2 - 10.
        assert_eq!(layout.len(), 2);
        assert_abs_diff_eq!(value, 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(grad[0], -12.0, epsilon = 1e-12);
        assert_abs_diff_eq!(grad[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Violation, multiplier update, splitting, and projection agree with
    // the term signs.
    fn multipliers_violation_and_projection() {
        // Arrange
        let layout = TermLayout::new(2, &toy_bounds(1.0, 1.0));
        let mut x = array![-0.5, 4.0];
        let c = array![x[0] + x[1]];
        let values = layout.values(&x, &c);
        let mut lambda = vec![0.0; layout.len()];

        // Act
        let violation = layout.violation(&values);
        layout.update_multipliers(&mut lambda, &values, 2.0);
        let (mult_g, mult_x_l, mult_x_u) = layout.split_multipliers(&lambda);
        layout.project(&mut x);

        // Assert: h = 2.5, s_l = -0.5, s_u = -1.
        assert_abs_diff_eq!(violation, 2.5, epsilon = 1e-12);
        assert_eq!(lambda, vec![5.0, 1.0, 2.0]);
        assert_eq!(mult_g, array![5.0]);
        assert_eq!(mult_x_l, array![1.0, 0.0]);
        assert_eq!(mult_x_u, array![0.0, 2.0]);
        assert_eq!(x, array![0.0, 3.0]);
    }

    #[test]
    // Purpose
    // -------
    // The first problem error is kept in the failure slot and still reaches
    // argmin as an error that downcasts back to it.
    //
    // Given
    // -----
    // - A problem whose objective fails with "first" and whose constraints
    //   fail with "second".
    //
    // Expect
    // ------
    // - Both merit calls fail; the slot holds "first" only.
    fn first_problem_error_is_recorded() {
        // Arrange
        let problem = Failing;
        let layout = TermLayout::new(2, &toy_bounds(1.0, 1.0));
        let lambda = [0.0, 0.0, 0.0];
        let failure = RefCell::new(None);
        let merit = AugmentedMerit::new(&problem, &layout, &lambda, 1.0, &failure);
        let x = array![0.0, 0.0];

        // Act
        let cost_err = merit.cost(&x).expect_err("objective fails");
        let grad_err = merit.gradient(&x).expect_err("gradient fails");

        // Assert
        assert_eq!(cost_err.downcast::<NlpError>().ok(), Some(NlpError::evaluation("first")));
        assert!(grad_err.downcast::<NlpError>().is_ok());
        assert_eq!(failure.take(), Some(NlpError::evaluation("first")));
    }

    // ---- Helper Methods ----

    /// Objective fails with "first"; gradient and constraints with "second".
    struct Failing;

    impl NlpProblem for Failing {
        fn objective(&self, _: &Point) -> NlpResult<Cost> {
            Err(NlpError::evaluation("first"))
        }

        fn gradient(&self, _: &Point) -> NlpResult<Grad> {
            Err(NlpError::evaluation("second"))
        }

        fn constraints(&self, _: &Point) -> NlpResult<ConstraintValues> {
            Err(NlpError::evaluation("second"))
        }

        fn jacobian(&self, _: &Point) -> NlpResult<Jacobian> {
            Err(NlpError::evaluation("second"))
        }

        fn intermediate(&self, _: &IterationReport) -> bool {
            true
        }
    }
}
