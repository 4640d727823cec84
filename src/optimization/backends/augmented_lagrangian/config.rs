//! augmented_lagrangian::config — solver options and their validation.
//!
//! Purpose
//! -------
//! Hold the run configuration of the augmented-Lagrangian backend and
//! accept options through the solver's `add_option(name, value)` contract,
//! using interior-point option names so the generic option translation
//! applies unchanged.
//!
//! Key behaviors
//! -------------
//! - Recognized options: `print_level`, `max_iter`, `tol`,
//!   `constr_viol_tol`, `acceptable_tol`, `mu_strategy`, `mu_init`,
//!   `hessian_approximation`, `limited_memory_max_history`.
//! - Unknown names, wrong value kinds, and out-of-range values are rejected
//!   with a message; the configuration is left unchanged on rejection.
//!
//! Conventions
//! -----------
//! - `mu_init` is read as the inverse of the initial penalty parameter
//!   (`rho_0 = 1 / mu_init`), so a small barrier-style value means a stiff
//!   initial penalty.
//! - Integer options accept only `OptionValue::Int`; real options accept
//!   `Num` and widen `Int`.
use crate::optimization::nlp_adapter::options::OptionValue;

/// Default outer-iteration limit.
pub const DEFAULT_MAX_ITER: usize = 3000;

/// Default L-BFGS history length.
pub const DEFAULT_LBFGS_MEM: usize = 6;

/// Penalty-parameter update strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuStrategy {
    /// Increase the penalty after every outer iteration that is infeasible.
    Monotone,
    /// Increase the penalty only when the violation fails to drop by 4×.
    Adaptive,
}

/// Augmented-Lagrangian run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AlConfig {
    pub print_level: i64,
    pub max_iter: usize,
    pub tol: f64,
    pub constr_viol_tol: f64,
    pub acceptable_tol: f64,
    pub mu_strategy: MuStrategy,
    pub mu_init: f64,
    pub lbfgs_mem: usize,
}

impl Default for AlConfig {
    fn default() -> Self {
        Self {
            print_level: 5,
            max_iter: DEFAULT_MAX_ITER,
            tol: 1e-8,
            constr_viol_tol: 1e-4,
            acceptable_tol: 1e-6,
            mu_strategy: MuStrategy::Monotone,
            mu_init: 0.1,
            lbfgs_mem: DEFAULT_LBFGS_MEM,
        }
    }
}

impl AlConfig {
    /// Apply one named option.
    ///
    /// # Errors
    /// A human-readable rejection message for unknown names, wrong value
    /// kinds, or out-of-range values.
    pub fn set(&mut self, name: &str, value: &OptionValue) -> Result<(), String> {
        match name {
            "print_level" => {
                let level = int_option(name, value)?;
                if !(0..=12).contains(&level) {
                    return Err(format!("{name} must be in 0..=12, got {level}"));
                }
                self.print_level = level;
            }
            "max_iter" => {
                let iters = int_option(name, value)?;
                self.max_iter = usize::try_from(iters)
                    .map_err(|_| format!("{name} must be >= 0, got {iters}"))?;
            }
            "tol" => self.tol = positive_num(name, value)?,
            "constr_viol_tol" => self.constr_viol_tol = positive_num(name, value)?,
            "acceptable_tol" => self.acceptable_tol = positive_num(name, value)?,
            "mu_init" => self.mu_init = positive_num(name, value)?,
            "mu_strategy" => {
                self.mu_strategy = match str_option(name, value)? {
                    "monotone" => MuStrategy::Monotone,
                    "adaptive" => MuStrategy::Adaptive,
                    other => {
                        return Err(format!(
                            "{name} must be \"monotone\" or \"adaptive\", got \"{other}\""
                        ));
                    }
                }
            }
            "hessian_approximation" => match str_option(name, value)? {
                "limited-memory" => {}
                other => {
                    return Err(format!(
                        "{name} \"{other}\" is not available: second derivatives are never \
                         evaluated"
                    ));
                }
            },
            "limited_memory_max_history" => {
                let mem = int_option(name, value)?;
                if mem < 1 {
                    return Err(format!("{name} must be >= 1, got {mem}"));
                }
                self.lbfgs_mem = mem as usize;
            }
            _ => return Err(format!("unknown option \"{name}\"")),
        }
        Ok(())
    }

    /// Initial penalty parameter.
    pub fn initial_penalty(&self) -> f64 {
        1.0 / self.mu_init
    }
}

// ---- Helper Methods ----

fn int_option(name: &str, value: &OptionValue) -> Result<i64, String> {
    value.as_int().ok_or_else(|| format!("{name} expects an integer, got a {}", value.kind()))
}

fn positive_num(name: &str, value: &OptionValue) -> Result<f64, String> {
    let v = value
        .as_num()
        .ok_or_else(|| format!("{name} expects a number, got a {}", value.kind()))?;
    if !v.is_finite() || v <= 0.0 {
        return Err(format!("{name} must be finite and positive, got {v}"));
    }
    Ok(v)
}

fn str_option<'v>(name: &str, value: &'v OptionValue) -> Result<&'v str, String> {
    value.as_str().ok_or_else(|| format!("{name} expects a string, got a {}", value.kind()))
}
