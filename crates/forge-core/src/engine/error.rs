use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::StructuredError;
use crate::core::mixing::MixingError;
use crate::core::store::StoreError;
use crate::core::tdb::TdbError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Database error: {source}")]
    Database {
        #[from]
        source: TdbError,
    },

    #[error("Structured data error: {source}")]
    Structured {
        #[from]
        source: StructuredError,
    },

    #[error("Document store error: {source}")]
    Store {
        #[from]
        source: StoreError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },

    #[error("Cannot derive non-equilibrium records: {0}")]
    Derivation(String),

    #[error("Mixing model failed: {source}")]
    Mixing {
        #[from]
        source: MixingError,
    },

    #[error("The database defines no optimizable symbols")]
    NothingToFit,

    #[error("Objective evaluation failed: {0}")]
    Evaluation(String),
}

impl EngineError {
    /// Whether this error reports a missing database file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::Database { source } if source.is_not_found())
    }

    /// Whether this error reports a rejected pressure, temperature or composition point.
    pub fn is_invalid_value(&self) -> bool {
        matches!(self, EngineError::InvalidValue { .. })
    }
}
