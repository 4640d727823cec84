//! nlp_adapter::constraints — constraint specifications and the ordered set.
//!
//! Purpose
//! -------
//! Replace the loosely-typed "constraint dictionary" with a tagged struct:
//! a vector-valued function, an optional Jacobian, a kind
//! ([`ConstraintKind::Equality`] / [`ConstraintKind::Inequality`]), and the
//! constraint's own extra arguments.
//!
//! Conventions
//! -----------
//! - Every constraint is recentered so that satisfaction means `c(x) = 0`
//!   (equality) or `c(x) >= 0` (inequality).
//! - [`ConstraintSet`] preserves insertion order; that order is the stacking
//!   order of values, Jacobian rows, and bound vectors for the whole run.
use std::{fmt, str::FromStr};

use crate::optimization::{
    errors::{NlpError, NlpResult},
    nlp_adapter::{
        args::Args,
        types::{ConstraintValues, Jacobian, Point},
    },
};

/// Vector-valued constraint function `c(x, args)` of arity `m_i`.
pub type ConstraintFn = Box<dyn Fn(&Point, &Args) -> NlpResult<ConstraintValues>>;

/// Jacobian of a constraint, shape `(m_i, n)`.
pub type ConstraintJacobianFn = Box<dyn Fn(&Point, &Args) -> NlpResult<Jacobian>>;

/// Constraint kind.
///
/// Parsing:
/// Implements `FromStr` for the tags `"eq"` and `"ineq"`. Any other tag
/// returns `NlpError::InvalidConstraintKind` naming the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Equality,
    Inequality,
}

impl ConstraintKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ConstraintKind::Equality => "eq",
            ConstraintKind::Inequality => "ineq",
        }
    }
}

impl FromStr for ConstraintKind {
    type Err = NlpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(ConstraintKind::Equality),
            "ineq" => Ok(ConstraintKind::Inequality),
            _ => Err(NlpError::InvalidConstraintKind { kind: s.to_string() }),
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One constraint specification.
pub struct ConstraintSpec {
    pub fun: ConstraintFn,
    pub jac: Option<ConstraintJacobianFn>,
    pub kind: ConstraintKind,
    pub args: Args,
}

impl ConstraintSpec {
    /// Specification from a kind tag (`"eq"` / `"ineq"`).
    ///
    /// # Errors
    /// [`NlpError::InvalidConstraintKind`] for any other tag.
    pub fn new<F>(kind: &str, fun: F) -> NlpResult<Self>
    where
        F: Fn(&Point, &Args) -> NlpResult<ConstraintValues> + 'static,
    {
        Ok(Self::with_kind(kind.parse()?, fun))
    }

    /// Equality constraint `c(x) = 0`.
    pub fn eq<F>(fun: F) -> Self
    where
        F: Fn(&Point, &Args) -> NlpResult<ConstraintValues> + 'static,
    {
        Self::with_kind(ConstraintKind::Equality, fun)
    }

    /// Inequality constraint `c(x) >= 0`.
    pub fn ineq<F>(fun: F) -> Self
    where
        F: Fn(&Point, &Args) -> NlpResult<ConstraintValues> + 'static,
    {
        Self::with_kind(ConstraintKind::Inequality, fun)
    }

    pub fn with_kind<F>(kind: ConstraintKind, fun: F) -> Self
    where
        F: Fn(&Point, &Args) -> NlpResult<ConstraintValues> + 'static,
    {
        Self { fun: Box::new(fun), jac: None, kind, args: Args::default() }
    }

    /// Attach an analytic Jacobian.
    pub fn with_jacobian<J>(mut self, jac: J) -> Self
    where
        J: Fn(&Point, &Args) -> NlpResult<Jacobian> + 'static,
    {
        self.jac = Some(Box::new(jac));
        self
    }

    /// Attach extra arguments passed to both `fun` and `jac`.
    pub fn with_args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    /// Evaluate `fun` at `x` with this constraint's arguments.
    pub fn eval(&self, x: &Point) -> NlpResult<ConstraintValues> {
        (self.fun)(x, &self.args)
    }
}

impl fmt::Debug for ConstraintSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintSpec")
            .field("kind", &self.kind)
            .field("jac", &self.jac.is_some())
            .field("args", &self.args)
            .finish()
    }
}

/// Ordered list of constraint specifications.
#[derive(Debug, Default)]
pub struct ConstraintSet {
    specs: Vec<ConstraintSpec>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, spec: ConstraintSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConstraintSpec> {
        self.specs.iter()
    }
}

impl From<ConstraintSpec> for ConstraintSet {
    fn from(spec: ConstraintSpec) -> Self {
        Self { specs: vec![spec] }
    }
}

impl From<Vec<ConstraintSpec>> for ConstraintSet {
    fn from(specs: Vec<ConstraintSpec>) -> Self {
        Self { specs }
    }
}

impl FromIterator<ConstraintSpec> for ConstraintSet {
    fn from_iter<T: IntoIterator<Item = ConstraintSpec>>(iter: T) -> Self {
        Self { specs: iter.into_iter().collect() }
    }
}

impl IntoIterator for ConstraintSet {
    type Item = ConstraintSpec;
    type IntoIter = std::vec::IntoIter<ConstraintSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.into_iter()
    }
}

impl<'a> IntoIterator for &'a ConstraintSet {
    type Item = &'a ConstraintSpec;
    type IntoIter = std::slice::Iter<'a, ConstraintSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.iter()
    }
}
