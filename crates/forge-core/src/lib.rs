//! # PhaseForge Core Library
//!
//! Data ingestion and parameter set-up for CALPHAD assessments: a thermodynamic
//! database, a directory of experimental phase-boundary (ZPF) datasets and a set of
//! derived non-equilibrium records are loaded, validated and bundled into a single
//! object that downstream optimizers can work from.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models and I/O: the TDB database
//!   model and parser, YAML loaders, the directory indexer, the document store and
//!   the mixing-property evaluation used to derive records.
//!
//! - **[`engine`]: The Logic Core.** Configuration and validation, the error
//!   taxonomy, progress reporting, derivation of non-equilibrium records and the
//!   objective/minimizer seam through which external optimizers are driven.
//!
//! - **[`workflows`]: The Public API.** [`workflows::experiment::ExperimentConfiguration`]
//!   ties the layers together: it validates every input at construction and exposes
//!   the initial parameter vector and the `optimize` entry point.

pub mod core;
pub mod engine;
pub mod workflows;

#[cfg(test)]
pub(crate) mod test_utils;
