//! nlp_adapter::options — generic option vocabulary and solver translation.
//!
//! Purpose
//! -------
//! Carry caller-supplied solver options as an explicit, per-call
//! configuration object and translate it into the names a solver expects
//! before applying each entry through [`NlpSolver::add_option`].
//!
//! Key behaviors
//! -------------
//! - Aliases: `disp → print_level`, `maxiter → max_iter`. When the target
//!   name is already set, the alias is dropped, not copied over.
//! - Defaults when absent: `print_level = 0`, `tol = <supplied or 1e-8>`,
//!   `mu_strategy = "adaptive"`, and `hessian_approximation =
//!   "limited-memory"` unless second-order information is in play.
//! - Unknown names pass through verbatim; the solver validates them.
//!
//! Conventions
//! -----------
//! - Options are kept in a `BTreeMap`, so they are applied in key order and
//!   every run with the same options configures the solver identically.
use std::{collections::BTreeMap, fmt};

use crate::optimization::{
    errors::{NlpError, NlpResult},
    nlp_adapter::{traits::NlpSolver, types::DEFAULT_TOL},
};

/// Generic name → solver name aliases.
pub const OPTION_ALIASES: [(&str, &str); 2] = [("disp", "print_level"), ("maxiter", "max_iter")];

/// Value of one solver option: integer, real, or string.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Int(i64),
    Num(f64),
    Str(String),
}

impl OptionValue {
    /// Name of the value kind, used in rejection messages.
    pub fn kind(&self) -> &'static str {
        match self {
            OptionValue::Int(_) => "integer",
            OptionValue::Num(_) => "number",
            OptionValue::Str(_) => "string",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Real value; integers widen to `f64`.
    pub fn as_num(&self) -> Option<f64> {
        match self {
            OptionValue::Num(v) => Some(*v),
            OptionValue::Int(v) => Some(*v as f64),
            OptionValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Int(v) => write!(f, "{v}"),
            OptionValue::Num(v) => write!(f, "{v}"),
            OptionValue::Str(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(i64::from(value))
    }
}

impl From<usize> for OptionValue {
    fn from(value: usize) -> Self {
        OptionValue::Int(value as i64)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Num(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

/// Caller-supplied options, keyed by (generic or solver) option name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverOptions {
    entries: BTreeMap<String, OptionValue>,
}

impl SolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, replacing any previous value.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<OptionValue> {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    // ---- Typed convenience setters ----

    /// Generic verbosity (alias of `print_level`).
    pub fn disp(self, level: i64) -> Self {
        self.set("disp", level)
    }

    /// Generic iteration cap (alias of `max_iter`).
    pub fn maxiter(self, iterations: usize) -> Self {
        self.set("maxiter", iterations)
    }

    pub fn print_level(self, level: i64) -> Self {
        self.set("print_level", level)
    }

    pub fn max_iter(self, iterations: usize) -> Self {
        self.set("max_iter", iterations)
    }

    pub fn tol(self, tol: f64) -> Self {
        self.set("tol", tol)
    }

    pub fn mu_strategy(self, strategy: &str) -> Self {
        self.set("mu_strategy", strategy)
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for SolverOptions {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let entries = iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { entries }
    }
}

/// Rename `old` to `new` unless `new` is already set, in which case `old`
/// is discarded.
pub fn replace_option(options: &mut SolverOptions, old: &str, new: &str) {
    if let Some(value) = options.remove(old) {
        if !options.contains(new) {
            options.insert(new, value);
        } else {
            log::debug!("dropping option alias '{old}': '{new}' is already set");
        }
    }
}

/// Translate generic options into solver names and inject defaults.
///
/// # Arguments
/// - `options`: caller options (consumed).
/// - `tol`: caller tolerance; `None` falls back to [`DEFAULT_TOL`].
/// - `second_order`: `true` when a Hessian or Hessian-vector product was
///   supplied; suppresses the `hessian_approximation` default.
pub fn translate(
    mut options: SolverOptions, tol: Option<f64>, second_order: bool,
) -> SolverOptions {
    for (old, new) in OPTION_ALIASES {
        replace_option(&mut options, old, new);
    }
    set_default(&mut options, "print_level", OptionValue::Int(0));
    set_default(&mut options, "tol", OptionValue::Num(tol.unwrap_or(DEFAULT_TOL)));
    set_default(&mut options, "mu_strategy", OptionValue::from("adaptive"));
    if !second_order {
        set_default(&mut options, "hessian_approximation", OptionValue::from("limited-memory"));
    }
    options
}

/// Apply every option to `solver`, in key order.
///
/// # Errors
/// [`NlpError::InvalidSolverOption`] for the first option the solver
/// rejects, carrying the name, the attempted value, and the solver's
/// message. Later options are not applied.
pub fn apply_options(solver: &mut dyn NlpSolver, options: &SolverOptions) -> NlpResult<()> {
    for (name, value) in options.iter() {
        log::debug!("setting solver option {name} = {value}");
        solver.add_option(name, value).map_err(|message| NlpError::InvalidSolverOption {
            name: name.to_string(),
            value: value.to_string(),
            message,
        })?;
    }
    Ok(())
}

// ---- Helper Methods ----

fn set_default(options: &mut SolverOptions, name: &str, value: OptionValue) {
    if !options.contains(name) {
        options.insert(name, value);
    }
}
