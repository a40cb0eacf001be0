//! # Engine Module
//!
//! Validation, derivation and the optimizer seam that sit between the raw data models
//! of [`crate::core`] and the public workflows.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - The experiment builder and the checks applied to
//!   pressure, temperature and composition points
//! - **Error Handling** ([`error`]) - [`error::EngineError`], which wraps every lower-level error
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events for front ends
//! - **Record Derivation** ([`neq`]) - Non-equilibrium mixing records built from composition points
//! - **Optimization Seam** ([`objective`]) - Residual objectives and the trait external
//!   minimizers implement

pub mod config;
pub mod error;
pub mod neq;
pub mod objective;
pub mod progress;
