//! High-level entry point: minimize a nonlinear program with any backend.
//!
//! A [`Minimize`] request collects the objective, starting point, extra
//! arguments, gradient choice, constraints, bounds, tolerance, and options.
//! [`minimize`] wraps them in a [`ProblemAdapter`], translates the bounds,
//! constructs a solver from the backend, applies the translated options,
//! runs the solver, and assembles an [`OptimizeResult`].
use crate::optimization::{
    errors::NlpResult,
    nlp_adapter::{
        adapter::ProblemAdapter,
        args::Args,
        bounds::variable_bounds,
        constraints::ConstraintSet,
        finite_diff::FdStep,
        objective::{GradientSpec, Objective, SecondOrder},
        options::{SolverOptions, apply_options, translate},
        result::{InitialPoint, OptimizeResult},
        traits::{ProblemBounds, SolverBackend},
        types::{Grad, Jacobian, Point},
        validation::verify_tol,
    },
};

/// One minimization request.
///
/// Only the objective and starting point are required; every other field
/// has a "not supplied" default.
pub struct Minimize {
    objective: Objective,
    x0: InitialPoint,
    args: Args,
    kwargs: Args,
    gradient: GradientSpec,
    second_order: SecondOrder,
    constraints: ConstraintSet,
    bounds: Option<Vec<(f64, f64)>>,
    tol: Option<f64>,
    options: SolverOptions,
    fd_step: FdStep,
}

impl Minimize {
    pub fn new(objective: Objective, x0: impl Into<InitialPoint>) -> Self {
        Self {
            objective,
            x0: x0.into(),
            args: Args::default(),
            kwargs: Args::default(),
            gradient: GradientSpec::default(),
            second_order: SecondOrder::default(),
            constraints: ConstraintSet::new(),
            bounds: None,
            tol: None,
            options: SolverOptions::new(),
            fd_step: FdStep::default(),
        }
    }

    /// Positional extra arguments for the objective and gradient.
    pub fn args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    /// Keyword extra arguments; merged over the keywords of `args`.
    pub fn kwargs(mut self, kwargs: Args) -> Self {
        self.kwargs = kwargs;
        self
    }

    pub fn gradient(mut self, gradient: GradientSpec) -> Self {
        self.gradient = gradient;
        self
    }

    /// Objective Hessian. Always rejected when the request runs.
    pub fn hess<H>(mut self, hess: H) -> Self
    where
        H: Fn(&Point, &Args) -> NlpResult<Jacobian> + 'static,
    {
        self.second_order.hess = Some(Box::new(hess));
        self
    }

    /// Hessian-vector product. Always rejected when the request runs.
    pub fn hessp<H>(mut self, hessp: H) -> Self
    where
        H: Fn(&Point, &Point, &Args) -> NlpResult<Grad> + 'static,
    {
        self.second_order.hessp = Some(Box::new(hessp));
        self
    }

    /// One constraint or an ordered list of them.
    pub fn constraints(mut self, constraints: impl Into<ConstraintSet>) -> Self {
        self.constraints = constraints.into();
        self
    }

    /// Per-variable `(lower, upper)` pairs.
    pub fn bounds(mut self, bounds: impl Into<Vec<(f64, f64)>>) -> Self {
        self.bounds = Some(bounds.into());
        self
    }

    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = Some(tol);
        self
    }

    pub fn options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn fd_step(mut self, step: FdStep) -> Self {
        self.fd_step = step;
        self
    }

    /// Shorthand for [`minimize`]`(self, backend)`.
    pub fn run<B: SolverBackend + ?Sized>(self, backend: &B) -> NlpResult<OptimizeResult> {
        minimize(self, backend)
    }
}

/// Minimize `request` with a solver built by `backend`.
///
/// # Behavior
/// 1. Validates the tolerance and builds the [`ProblemAdapter`]
///    (second-order callbacks and bad gradient pairings fail here).
/// 2. Translates variable bounds and probes constraint arities at `x0`.
/// 3. Constructs the solver with `(n, m, adapter, bounds)`.
/// 4. Translates and applies options one at a time.
/// 5. Solves from `x0` and assembles the result.
///
/// # Errors
/// - Configuration errors from steps 1–4, before any solver iteration.
/// - Evaluation errors raised by user callbacks during the solve,
///   unchanged.
///
/// A nonzero solver status is not an error; it is reported as
/// `success == false` in the result.
///
/// # Example
/// ```rust
/// use ndarray::array;
/// use rust_nlp::optimization::{
///     backends::AugmentedLagrangian,
///     nlp_adapter::{Args, Minimize, Objective, Point},
/// };
///
/// let objective =
///     Objective::scalar(|x: &Point, _: &Args| Ok((x[0] - 1.0).powi(2) + (x[1] - 2.5).powi(2)));
/// let result = Minimize::new(objective, vec![2.0, 0.0])
///     .bounds(vec![(0.0, f64::INFINITY), (0.0, f64::INFINITY)])
///     .run(&AugmentedLagrangian::default())?;
/// assert!(result.success);
/// assert!((result.x.as_vector() - array![1.0, 2.5]).iter().all(|d| d.abs() < 1e-4));
/// # Ok::<(), rust_nlp::optimization::errors::NlpError>(())
/// ```
pub fn minimize<B: SolverBackend + ?Sized>(
    request: Minimize, backend: &B,
) -> NlpResult<OptimizeResult> {
    let Minimize {
        objective,
        x0,
        args,
        kwargs,
        gradient,
        second_order,
        constraints,
        bounds,
        tol,
        options,
        fd_step,
    } = request;
    let tol = verify_tol(tol)?;
    let x = x0.to_point();
    let n = x.len();
    let second_order_in_play = second_order.in_play();

    let adapter = ProblemAdapter::new(objective, gradient, &second_order, n)?
        .with_args(args.merge_keywords(kwargs))
        .with_constraints(constraints)
        .with_fd_step(fd_step)?;

    let (x_lower, x_upper) = variable_bounds(bounds.as_deref(), n)?;
    let g_bounds = adapter.constraint_bounds(&x)?;
    let m = g_bounds.len();
    let problem_bounds =
        ProblemBounds { x_lower, x_upper, g_lower: g_bounds.lower, g_upper: g_bounds.upper };

    let mut solver = backend.create(n, m, &adapter, problem_bounds)?;
    let options = translate(options, tol, second_order_in_play);
    apply_options(solver.as_mut(), &options)?;
    log::debug!("solving n={n} m={m} with {} option(s)", options.len());

    let (x_final, info) = solver.solve(&x)?;
    log::debug!("solver finished: status={} ({})", info.status, info.status_msg);
    Ok(OptimizeResult::assemble(&x0, x_final, info, adapter.counters()))
}
