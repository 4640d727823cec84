//! augmented_lagrangian::run — outer multiplier loop around argmin L-BFGS.
//!
//! Purpose
//! -------
//! Solve `min f(x)` subject to stacked constraint bounds and variable
//! bounds by a sequence of unconstrained L-BFGS solves of the PHR merit
//! ([`AugmentedMerit`]), updating multipliers and the penalty between
//! solves, and report progress through `NlpProblem::intermediate`.
//!
//! Key behaviors
//! -------------
//! - Each outer iteration: inner L-BFGS (More–Thuente line search) from the
//!   current point, multiplier update, one `intermediate` report.
//! - Penalty `ρ` grows by [`PENALTY_GROWTH`] on infeasible iterations
//!   (every one for `monotone`, only stalled ones for `adaptive`).
//! - Terminal statuses use interior-point numbering:
//!   - `0` when feasible within `constr_viol_tol` and the outer step is
//!     below `sqrt(tol)` (relative to `1 + ‖x‖∞`);
//!   - `1` when the inner solver breaks down at a feasible point, or the
//!     iteration limit is hit with the `acceptable_tol` step test met;
//!   - `2` when `ρ` exceeds [`MAX_PENALTY`] while still infeasible;
//!   - `5` when `intermediate` returns `false`;
//!   - `-1` when the outer iteration limit is reached.
//!
//! Invariants & assumptions
//! ------------------------
//! - Problem evaluation errors abort the run and are returned unchanged,
//!   including errors raised inside a line search, which argmin reports as
//!   a solver exit rather than an error.
//! - Any other inner-solver error or solver exit counts as a breakdown.
//! - The returned point is projected onto the variable box.
use std::cell::RefCell;

use argmin::{
    core::{Executor, State, TerminationReason, TerminationStatus},
    solver::{linesearch::MoreThuenteLineSearch, quasinewton::LBFGS},
};

use crate::optimization::{
    backends::augmented_lagrangian::{
        config::{AlConfig, MuStrategy},
        merit::{AugmentedMerit, TermLayout},
    },
    errors::NlpResult,
    nlp_adapter::{
        traits::{IterationReport, NlpProblem, SolverInfo},
        types::{ConstraintValues, Grad, Point},
    },
};

/// Factor applied to `ρ` when the penalty is increased.
pub const PENALTY_GROWTH: f64 = 10.0;

/// Penalty beyond which a still-infeasible problem is declared infeasible.
pub const MAX_PENALTY: f64 = 1e12;

/// Iteration cap of each inner L-BFGS solve.
pub const INNER_MAX_ITERS: u64 = 1000;

/// Lower bound on the inner gradient tolerance.
pub const INNER_GRAD_FLOOR: f64 = 1e-6;

/// L-BFGS with More–Thuente line search over the merit's numeric types.
type MeritLbfgs = LBFGS<MoreThuenteLineSearch<Point, Grad, f64>, Point, Grad, f64>;

/// Terminal state of an outer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Succeeded,
    Acceptable,
    Infeasible,
    UserStop,
    MaxIter,
}

impl Termination {
    pub fn status(&self) -> i32 {
        match self {
            Termination::Succeeded => 0,
            Termination::Acceptable => 1,
            Termination::Infeasible => 2,
            Termination::UserStop => 5,
            Termination::MaxIter => -1,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Termination::Succeeded => "Solve_Succeeded",
            Termination::Acceptable => "Solved_To_Acceptable_Level",
            Termination::Infeasible => "Infeasible_Problem_Detected",
            Termination::UserStop => "User_Requested_Stop",
            Termination::MaxIter => "Maximum_Iterations_Exceeded",
        }
    }
}

/// Result of one inner L-BFGS solve.
#[derive(Debug, Clone)]
struct InnerOutcome {
    x: Point,
    grad_norm: f64,
    iterations: usize,
    stalled: bool,
}

/// Run the augmented-Lagrangian method from `x0`.
///
/// # Errors
/// - Evaluation errors raised by `problem`, unchanged.
/// - Invalid L-BFGS tolerances, mapped through `From<argmin::core::Error>`.
pub fn run_augmented_lagrangian(
    problem: &dyn NlpProblem, layout: &TermLayout, config: &AlConfig, x0: &Point,
) -> NlpResult<(Point, SolverInfo)> {
    let mut x = x0.clone();
    layout.project(&mut x);
    let mut lambda = vec![0.0; layout.len()];
    let mut rho = config.initial_penalty();
    let c0 = constraint_values(problem, layout, &x)?;
    let mut violation = layout.violation(&layout.values(&x, &c0));
    let mut last_step = f64::INFINITY;
    let mut termination = Termination::MaxIter;

    if config.print_level >= 5 {
        log::info!(
            "augmented Lagrangian: n={} m={} terms={} rho0={rho:.3e}",
            layout.n,
            layout.m,
            layout.len()
        );
    }

    for iter in 1..=config.max_iter {
        let inner = minimize_merit(problem, layout, &lambda, rho, config, &x)?;
        let d_norm = inf_norm(&(&inner.x - &x));
        x = inner.x;
        let values = layout.values(&x, &constraint_values(problem, layout, &x)?);
        let previous = violation;
        violation = layout.violation(&values);
        layout.update_multipliers(&mut lambda, &values, rho);
        last_step = d_norm;

        let obj_value = problem.objective(&x)?;
        let report = IterationReport {
            alg_mod: 0,
            iter_count: iter,
            obj_value,
            inf_pr: violation,
            inf_du: inner.grad_norm,
            mu: 1.0 / rho,
            d_norm,
            regularization_size: 0.0,
            alpha_du: 1.0,
            alpha_pr: 1.0,
            ls_trials: inner.iterations,
        };
        if config.print_level >= 5 {
            log::info!(
                "iter {iter:>4}  f={obj_value:+.8e}  inf_pr={violation:.2e}  inf_du={:.2e}  \
                 rho={rho:.1e}  ||d||={d_norm:.2e}",
                inner.grad_norm
            );
        }
        if !problem.intermediate(&report) {
            termination = Termination::UserStop;
            break;
        }

        let feasible = violation <= config.constr_viol_tol;
        if inner.stalled && feasible {
            termination = Termination::Acceptable;
            break;
        }
        if feasible && d_norm <= config.tol.sqrt() * scale(&x) {
            termination = Termination::Succeeded;
            break;
        }
        if !feasible {
            let slow = violation > 0.25 * previous;
            if inner.stalled || slow || config.mu_strategy == MuStrategy::Monotone {
                rho *= PENALTY_GROWTH;
            }
            if rho > MAX_PENALTY {
                termination = Termination::Infeasible;
                break;
            }
        }
    }

    if termination == Termination::MaxIter
        && violation <= config.constr_viol_tol
        && last_step <= config.acceptable_tol.sqrt() * scale(&x)
    {
        termination = Termination::Acceptable;
    }

    layout.project(&mut x);
    let info = final_info(problem, layout, &x, &lambda, termination)?;
    if config.print_level >= 5 {
        log::info!(
            "{} (status {}), f={:+.8e}",
            termination.message(),
            termination.status(),
            info.obj_val
        );
    }
    Ok((x, info))
}

// ---- Helper Methods ----

/// One L-BFGS solve of the merit for fixed `(λ, ρ)`.
///
/// The first problem error seen by the merit wins over whatever argmin
/// reports, so a failed line-search evaluation is never read as a stop.
fn minimize_merit(
    problem: &dyn NlpProblem, layout: &TermLayout, lambda: &[f64], rho: f64, config: &AlConfig,
    x0: &Point,
) -> NlpResult<InnerOutcome> {
    let failure = RefCell::new(None);
    let merit = AugmentedMerit::new(problem, layout, lambda, rho, &failure);
    let linesearch = MoreThuenteLineSearch::new();
    let tol_grad = config.tol.max(INNER_GRAD_FLOOR);
    let solver = MeritLbfgs::new(linesearch, config.lbfgs_mem)
        .with_tolerance_grad(tol_grad)?
        .with_tolerance_cost((0.1 * config.tol).max(1e-12))?;

    let start = x0.clone();
    let mut executor = Executor::new(merit, solver);
    executor = executor.configure(|state| state.param(start).max_iters(INNER_MAX_ITERS));
    #[cfg(feature = "obs_slog")]
    if config.print_level >= 8 {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        executor = executor.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }

    let outcome = executor.run();
    if let Some(user_err) = failure.take() {
        return Err(user_err);
    }
    match outcome {
        Ok(result) => {
            let state = result.state();
            let stalled = match state.get_termination_status() {
                TerminationStatus::Terminated(TerminationReason::SolverExit(reason)) => {
                    log::warn!("inner L-BFGS exited early: {reason}");
                    true
                }
                _ => false,
            };
            Ok(InnerOutcome {
                x: state.get_best_param().cloned().unwrap_or_else(|| x0.clone()),
                grad_norm: state.get_gradient().map(inf_norm).unwrap_or(f64::NAN),
                iterations: state.get_iter() as usize,
                stalled,
            })
        }
        Err(breakdown) => {
            log::warn!("inner L-BFGS stopped early, keeping the current point: {breakdown}");
            Ok(InnerOutcome { x: x0.clone(), grad_norm: f64::NAN, iterations: 0, stalled: true })
        }
    }
}

fn constraint_values(
    problem: &dyn NlpProblem, layout: &TermLayout, x: &Point,
) -> NlpResult<ConstraintValues> {
    if layout.m == 0 {
        return Ok(ConstraintValues::zeros(0));
    }
    problem.constraints(x)
}

fn final_info(
    problem: &dyn NlpProblem, layout: &TermLayout, x: &Point, lambda: &[f64],
    termination: Termination,
) -> NlpResult<SolverInfo> {
    let obj_val = problem.objective(x)?;
    let mut info =
        SolverInfo::new(termination.status(), termination.message(), obj_val, x.clone());
    info.g = constraint_values(problem, layout, x)?;
    let (mult_g, mult_x_l, mult_x_u) = layout.split_multipliers(lambda);
    info.mult_g = mult_g;
    info.mult_x_l = mult_x_l;
    info.mult_x_u = mult_x_u;
    Ok(info)
}

fn inf_norm(v: &Point) -> f64 {
    v.iter().fold(0.0, |acc: f64, x| acc.max(x.abs()))
}

fn scale(x: &Point) -> f64 {
    1.0 + inf_norm(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{
        errors::NlpError,
        nlp_adapter::{traits::ProblemBounds, types::{Cost, INF_SENTINEL, Jacobian}},
    };
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use std::cell::Cell;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Convergence on small bound- and equality-constrained problems.
    // - Infeasibility detection, user stop, and the iteration limit.
    // - Propagation of problem evaluation errors, including those raised at
    //   line-search trial points.
    // -------------------------------------------------------------------------

    /// `f = (x0 - 1)² + (x1 - 2.5)²` with a configurable list of linear
    /// constraints `a·x`. The objective (gradient) fails once `x0` exceeds
    /// `objective_domain` (`gradient_domain`).
    struct Quadratic {
        rows: Vec<[f64; 2]>,
        stop_after: Option<usize>,
        objective_domain: f64,
        gradient_domain: f64,
        iterations: Cell<usize>,
    }

    impl Quadratic {
        fn new(rows: Vec<[f64; 2]>) -> Self {
            Self {
                rows,
                stop_after: None,
                objective_domain: f64::INFINITY,
                gradient_domain: f64::INFINITY,
                iterations: Cell::new(0),
            }
        }
    }

    impl NlpProblem for Quadratic {
        fn objective(&self, x: &Point) -> NlpResult<Cost> {
            if x[0] > self.objective_domain {
                return Err(NlpError::evaluation("objective failed"));
            }
            Ok((x[0] - 1.0).powi(2) + (x[1] - 2.5).powi(2))
        }

        fn gradient(&self, x: &Point) -> NlpResult<Grad> {
            if x[0] > self.gradient_domain {
                return Err(NlpError::evaluation("gradient failed"));
            }
            Ok(array![2.0 * (x[0] - 1.0), 2.0 * (x[1] - 2.5)])
        }

        fn constraints(&self, x: &Point) -> NlpResult<ConstraintValues> {
            Ok(self.rows.iter().map(|a| a[0] * x[0] + a[1] * x[1]).collect())
        }

        fn jacobian(&self, _: &Point) -> NlpResult<Jacobian> {
            let mut jac = Jacobian::zeros((self.rows.len(), 2));
            for (j, a) in self.rows.iter().enumerate() {
                jac[[j, 0]] = a[0];
                jac[[j, 1]] = a[1];
            }
            Ok(jac)
        }

        fn intermediate(&self, report: &IterationReport) -> bool {
            self.iterations.set(report.iter_count);
            self.stop_after.is_none_or(|limit| report.iter_count < limit)
        }
    }

    fn bounds(g_lower: Vec<f64>, g_upper: Vec<f64>, boxed: bool) -> ProblemBounds {
        let (x_lower, x_upper) = if boxed {
            (Some(array![0.0, 0.0]), Some(array![INF_SENTINEL, 2.0]))
        } else {
            (None, None)
        };
        ProblemBounds { x_lower, x_upper, g_lower: g_lower.into(), g_upper: g_upper.into() }
    }

    fn quiet() -> AlConfig {
        AlConfig { print_level: 0, ..AlConfig::default() }
    }

    #[test]
    // Purpose
    // -------
    // An active upper bound is found and reported with a positive
    // upper-bound multiplier.
    //
    // Given
    // -----
    // - Box `0 <= x0`, `0 <= x1 <= 2`, no constraints, start `(0, 0)`.
    //
    // Expect
    // ------
    // - Status 0, `x ≈ (1, 2)`, `mult_x_u[1] ≈ 1` (= -∂f/∂x1 at the bound).
    fn active_bound_converges() {
        // Arrange
        let problem = Quadratic::new(vec![]);
        let pb = bounds(vec![], vec![], true);
        let layout = TermLayout::new(2, &pb);

        // Act
        let (x, info) =
            run_augmented_lagrangian(&problem, &layout, &quiet(), &array![0.0, 0.0]).expect("run");

        // Assert
        assert_eq!(info.status, 0, "{}", info.status_msg);
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(x[1], 2.0, epsilon = 1e-4);
        assert_abs_diff_eq!(info.mult_x_u[1], 1.0, epsilon = 1e-3);
        assert!(problem.iterations.get() >= 1);
    }

    #[test]
    // Purpose
    // -------
    // An equality constraint is satisfied at the projected optimum.
    //
    // Given
    // -----
    // - `x0 + x1 = 1`, unbounded variables.
    //
    // Expect
    // ------
    // - Status 0, `x ≈ (-0.25, 1.25)`, `g ≈ [1]`.
    fn equality_constraint_converges() {
        // Arrange
        let problem = Quadratic::new(vec![[1.0, 1.0]]);
        let pb = bounds(vec![1.0], vec![1.0], false);
        let layout = TermLayout::new(2, &pb);

        // Act
        let (x, info) =
            run_augmented_lagrangian(&problem, &layout, &quiet(), &array![0.0, 0.0]).expect("run");

        // Assert
        assert_eq!(info.status, 0, "{}", info.status_msg);
        assert_abs_diff_eq!(x[0], -0.25, epsilon = 1e-4);
        assert_abs_diff_eq!(x[1], 1.25, epsilon = 1e-4);
        assert_abs_diff_eq!(info.g[0], 1.0, epsilon = 1e-4);
    }

    #[test]
    // Purpose
    // -------
    // Contradictory equalities end with the infeasibility status.
    fn contradictory_equalities_are_infeasible() {
        let problem = Quadratic::new(vec![[1.0, 1.0], [1.0, 1.0]]);
        let pb = bounds(vec![1.0, 5.0], vec![1.0, 5.0], false);
        let layout = TermLayout::new(2, &pb);

        let (_, info) =
            run_augmented_lagrangian(&problem, &layout, &quiet(), &array![0.0, 0.0]).expect("run");

        assert_eq!(info.status, 2);
        assert_eq!(info.status_msg, "Infeasible_Problem_Detected");
    }

    #[test]
    // Purpose
    // -------
    // A `false` from `intermediate` stops the run; a zero iteration limit
    // returns the projected start with status -1.
    fn user_stop_and_iteration_limit() {
        // Arrange
        let mut stopping = Quadratic::new(vec![[1.0, 1.0]]);
        stopping.stop_after = Some(1);
        let pb = bounds(vec![1.0], vec![1.0], false);
        let layout = TermLayout::new(2, &pb);
        let no_iters = AlConfig { max_iter: 0, ..quiet() };

        // Act
        let (_, stopped) =
            run_augmented_lagrangian(&stopping, &layout, &quiet(), &array![0.0, 0.0]).expect("run");
        let (x, limited) = run_augmented_lagrangian(
            &Quadratic::new(vec![]),
            &TermLayout::new(2, &bounds(vec![], vec![], true)),
            &no_iters,
            &array![-3.0, 7.0],
        )
        .expect("run");

        // Assert
        assert_eq!(stopped.status, 5);
        assert_eq!(stopping.iterations.get(), 1);
        assert_eq!(limited.status, -1);
        assert_eq!(x, array![0.0, 2.0]);
    }

    #[test]
    // Purpose
    // -------
    // Problem evaluation errors abort the run unchanged.
    //
    // Given
    // -----
    // - An objective failing everywhere (error at the first evaluation).
    //
    // Expect
    // ------
    // - `Err(Evaluation("objective failed"))`.
    fn evaluation_errors_propagate() {
        let mut failing = Quadratic::new(vec![]);
        failing.objective_domain = f64::NEG_INFINITY;
        let layout = TermLayout::new(2, &bounds(vec![], vec![], false));

        let result = run_augmented_lagrangian(&failing, &layout, &quiet(), &array![0.0, 0.0]);

        assert_eq!(result, Err(NlpError::evaluation("objective failed")));
    }

    #[test]
    // Purpose
    // -------
    // Errors raised at line-search trial points abort the run instead of
    // ending the inner solve as if it had stopped.
    //
    // Given
    // -----
    // - Start `(0, 0)`, feasible and valid; the objective fails for
    //   `x0 > 0.5` in one problem, the gradient in the other. The first
    //   L-BFGS step along `-∇f = (2, 5)` lands beyond that limit.
    //
    // Expect
    // ------
    // - Each run returns its own evaluation error, never a status.
    fn line_search_errors_propagate() {
        // Arrange
        let mut bad_objective = Quadratic::new(vec![]);
        bad_objective.objective_domain = 0.5;
        let mut bad_gradient = Quadratic::new(vec![]);
        bad_gradient.gradient_domain = 0.5;
        let layout = TermLayout::new(2, &bounds(vec![], vec![], false));
        let x0 = array![0.0, 0.0];

        // Act
        let objective = run_augmented_lagrangian(&bad_objective, &layout, &quiet(), &x0);
        let gradient = run_augmented_lagrangian(&bad_gradient, &layout, &quiet(), &x0);

        // Assert
        assert_eq!(objective, Err(NlpError::evaluation("objective failed")));
        assert_eq!(gradient, Err(NlpError::evaluation("gradient failed")));
        assert_eq!(bad_objective.iterations.get(), 0);
    }
}
