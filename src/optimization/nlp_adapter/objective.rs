//! Objective, gradient, and second-order specifications.
//!
//! The gradient argument of the generic `minimize` call is an explicit
//! three-way choice ([`GradientSpec`]): finite differences, a combined
//! `(value, gradient)` objective, or a standalone gradient callback. Which
//! choices are legal depends on the form of the [`Objective`], and that
//! pairing is checked once, when the adapter is built.
use std::fmt;

use crate::optimization::{
    errors::{NlpError, NlpResult},
    nlp_adapter::{
        args::Args,
        types::{Cost, Grad, Point},
    },
};

/// Scalar objective `f(x, args)`.
pub type ObjectiveFn = Box<dyn Fn(&Point, &Args) -> NlpResult<Cost>>;

/// Objective returning `(f(x), ∇f(x))` from one evaluation.
pub type CombinedFn = Box<dyn Fn(&Point, &Args) -> NlpResult<(Cost, Grad)>>;

/// Standalone gradient `∇f(x, args)`.
pub type GradientFn = Box<dyn Fn(&Point, &Args) -> NlpResult<Grad>>;

/// Hessian of the objective. Accepted only to be rejected.
pub type HessianFn = Box<dyn Fn(&Point, &Args) -> NlpResult<ndarray::Array2<f64>>>;

/// Hessian-vector product. Accepted only to be rejected.
pub type HessianProductFn = Box<dyn Fn(&Point, &Point, &Args) -> NlpResult<Grad>>;

/// The user objective.
pub enum Objective {
    Scalar(ObjectiveFn),
    Combined(CombinedFn),
}

impl Objective {
    pub fn scalar<F>(f: F) -> Self
    where
        F: Fn(&Point, &Args) -> NlpResult<Cost> + 'static,
    {
        Objective::Scalar(Box::new(f))
    }

    pub fn combined<F>(f: F) -> Self
    where
        F: Fn(&Point, &Args) -> NlpResult<(Cost, Grad)> + 'static,
    {
        Objective::Combined(Box::new(f))
    }

    pub(crate) fn form(&self) -> &'static str {
        match self {
            Objective::Scalar(_) => "scalar",
            Objective::Combined(_) => "combined",
        }
    }
}

impl fmt::Debug for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Objective::{}", self.form())
    }
}

/// How the objective gradient is obtained.
#[derive(Default)]
pub enum GradientSpec {
    /// No gradient: forward differences of the objective.
    #[default]
    None,
    /// The objective itself returns `(value, gradient)`.
    Combined,
    /// A standalone gradient callback.
    Explicit(GradientFn),
}

impl GradientSpec {
    pub fn explicit<G>(g: G) -> Self
    where
        G: Fn(&Point, &Args) -> NlpResult<Grad> + 'static,
    {
        GradientSpec::Explicit(Box::new(g))
    }

    pub(crate) fn form(&self) -> &'static str {
        match self {
            GradientSpec::None => "missing",
            GradientSpec::Combined => "combined",
            GradientSpec::Explicit(_) => "explicit",
        }
    }
}

impl fmt::Debug for GradientSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GradientSpec::{}", self.form())
    }
}

/// Second-derivative callbacks a caller may try to pass.
#[derive(Default)]
pub struct SecondOrder {
    pub hess: Option<HessianFn>,
    pub hessp: Option<HessianProductFn>,
}

impl SecondOrder {
    pub fn in_play(&self) -> bool {
        self.hess.is_some() || self.hessp.is_some()
    }

    /// # Errors
    /// [`NlpError::UnsupportedFeature`] naming `hess` or `hessp`.
    pub fn reject(&self) -> NlpResult<()> {
        if self.hess.is_some() {
            return Err(NlpError::UnsupportedFeature { feature: "hess" });
        }
        if self.hessp.is_some() {
            return Err(NlpError::UnsupportedFeature { feature: "hessp" });
        }
        Ok(())
    }
}

/// Resolved evaluation strategy for objective and gradient.
pub(crate) enum Evaluator {
    /// Scalar objective, gradient by forward differences.
    Approximate(ObjectiveFn),
    /// Scalar objective plus standalone gradient.
    Separate(ObjectiveFn, GradientFn),
    /// One combined call, memoized per point.
    Combined(CombinedFn),
}

/// Check the objective/gradient pairing and resolve the evaluator.
///
/// # Errors
/// [`NlpError::InvalidGradientSpec`] for `(Scalar, Combined)`,
/// `(Combined, None)`, and `(Combined, Explicit)`.
pub(crate) fn resolve_evaluator(
    objective: Objective, gradient: GradientSpec,
) -> NlpResult<Evaluator> {
    let invalid =
        NlpError::InvalidGradientSpec { objective: objective.form(), gradient: gradient.form() };
    match (objective, gradient) {
        (Objective::Scalar(f), GradientSpec::None) => Ok(Evaluator::Approximate(f)),
        (Objective::Scalar(f), GradientSpec::Explicit(g)) => Ok(Evaluator::Separate(f, g)),
        (Objective::Combined(fg), GradientSpec::Combined) => Ok(Evaluator::Combined(fg)),
        _ => Err(invalid),
    }
}
