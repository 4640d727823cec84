//! rust_nlp — drive interior-point style NLP solvers from plain Rust callbacks.
//!
//! Purpose
//! -------
//! Serve as the crate root for the nonlinear-programming adapter: a
//! `minimize` entry point that accepts an objective, optional gradient,
//! equality/inequality constraints, variable bounds, and solver options,
//! and runs them through any solver implementing the backend contract.
//!
//! Key behaviors
//! -------------
//! - Re-export the `optimization` module tree as the public surface.
//! - Keep the solver boundary trait-based, so native interior-point
//!   bindings and the built-in augmented-Lagrangian backend are
//!   interchangeable.
//!
//! Downstream usage
//! ----------------
//! ```rust
//! use rust_nlp::optimization::prelude::*;
//!
//! let objective = Objective::scalar(|x: &Point, _: &Args| Ok((x[0] - 2.0).powi(2)));
//! let result = Minimize::new(objective, 0.0).run(&AugmentedLagrangian::default())?;
//! assert!(result.success);
//! assert!((result.x.as_scalar().unwrap_or(f64::NAN) - 2.0).abs() < 1e-4);
//! # Ok::<(), NlpError>(())
//! ```

pub mod optimization;
