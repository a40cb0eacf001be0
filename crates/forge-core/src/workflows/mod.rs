//! # Workflows Module
//!
//! Top-level entry points of the library.
//!
//! - **Experiment** ([`experiment`]) - [`experiment::ExperimentConfiguration`] loads a
//!   database and a data directory, validates the physical conditions, derives the
//!   non-equilibrium records and hands the assembled problem to a minimizer.

pub mod experiment;
