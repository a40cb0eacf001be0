//! # Core Module
//!
//! Fundamental building blocks shared by the engine and the workflows.
//!
//! - **Thermodynamic databases** ([`tdb`]) - Phases, constituents, symbols and model
//!   parameters parsed from TDB files, with an evaluator for their piecewise expressions
//! - **File I/O** ([`io`]) - Loaders for databases and YAML datasets, and the directory indexer
//! - **Document storage** ([`store`]) - An ordered, persistable, queryable record collection
//! - **Mixing properties** ([`mixing`]) - Redlich-Kister mixing quantities of binary phases
//!
//! Nothing in this module keeps global state; every path and condition is passed in
//! explicitly by the caller.

pub mod io;
pub mod mixing;
pub mod store;
pub mod tdb;
