//! Fixed extra arguments captured once per run and handed to every callback.
//!
//! The objective receives the request-level [`Args`]; each constraint carries
//! its own. Values are immutable for the lifetime of a run.
use std::collections::BTreeMap;

use ndarray::Array1;

use crate::optimization::errors::{NlpError, NlpResult};

/// One extra argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Scalar(f64),
    Vector(Array1<f64>),
    Text(String),
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Scalar(value)
    }
}

impl From<Array1<f64>> for ArgValue {
    fn from(value: Array1<f64>) -> Self {
        ArgValue::Vector(value)
    }
}

impl From<Vec<f64>> for ArgValue {
    fn from(value: Vec<f64>) -> Self {
        ArgValue::Vector(Array1::from(value))
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Text(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Text(value)
    }
}

/// Positional and keyword extra arguments.
///
/// `Args::default()` is the empty set, which is what callbacks see when the
/// caller supplies nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<ArgValue>,
    keyword: BTreeMap<String, ArgValue>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from positional values only.
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ArgValue>,
    {
        Self { positional: values.into_iter().map(Into::into).collect(), keyword: BTreeMap::new() }
    }

    /// Append a positional value.
    pub fn push(mut self, value: impl Into<ArgValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Insert (or replace) a keyword value.
    pub fn with_keyword(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    /// Merge keyword values from `other`, keeping positional values of `self`.
    pub(crate) fn merge_keywords(mut self, other: Args) -> Self {
        self.keyword.extend(other.keyword);
        self
    }

    pub fn len(&self) -> usize {
        self.positional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ArgValue> {
        self.positional.get(index)
    }

    pub fn keyword(&self, name: &str) -> Option<&ArgValue> {
        self.keyword.get(name)
    }

    /// Positional scalar at `index`.
    ///
    /// # Errors
    /// - [`NlpError::MissingArgument`] when `index` is out of range.
    /// - [`NlpError::ArgumentType`] when the value is not a scalar.
    pub fn scalar(&self, index: usize) -> NlpResult<f64> {
        let name = format!("#{index}");
        match self.positional.get(index) {
            Some(value) => as_scalar(value, name),
            None => Err(NlpError::MissingArgument { name }),
        }
    }

    /// Positional vector at `index`.
    pub fn vector(&self, index: usize) -> NlpResult<&Array1<f64>> {
        let name = format!("#{index}");
        match self.positional.get(index) {
            Some(value) => as_vector(value, name),
            None => Err(NlpError::MissingArgument { name }),
        }
    }

    /// Keyword scalar called `name`.
    pub fn keyword_scalar(&self, name: &str) -> NlpResult<f64> {
        match self.keyword.get(name) {
            Some(value) => as_scalar(value, name.to_string()),
            None => Err(NlpError::MissingArgument { name: name.to_string() }),
        }
    }

    /// Keyword vector called `name`.
    pub fn keyword_vector(&self, name: &str) -> NlpResult<&Array1<f64>> {
        match self.keyword.get(name) {
            Some(value) => as_vector(value, name.to_string()),
            None => Err(NlpError::MissingArgument { name: name.to_string() }),
        }
    }
}

// ---- Helper Methods ----

fn as_scalar(value: &ArgValue, name: String) -> NlpResult<f64> {
    match value {
        ArgValue::Scalar(v) => Ok(*v),
        _ => Err(NlpError::ArgumentType { name, expected: "scalar" }),
    }
}

fn as_vector(value: &ArgValue, name: String) -> NlpResult<&Array1<f64>> {
    match value {
        ArgValue::Vector(v) => Ok(v),
        _ => Err(NlpError::ArgumentType { name, expected: "vector" }),
    }
}
