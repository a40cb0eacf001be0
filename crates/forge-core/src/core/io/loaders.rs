use crate::core::store::StructuredRecord;
use crate::core::tdb::{Database, TdbError};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Where structured text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredSource {
    /// A file on disk.
    Path(PathBuf),
    /// Structured text supplied directly.
    Text(String),
}

impl StructuredSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    fn describe(&self) -> String {
        match self {
            Self::Path(p) => p.to_string_lossy().to_string(),
            Self::Text(_) => "<text>".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StructuredError {
    #[error("File I/O error for '{path}': {source}")]
    Io { path: String, source: io::Error },
    #[error("YAML parsing error for '{origin}': {source}")]
    Parse {
        origin: String,
        source: serde_yaml::Error,
    },
    #[error("Structured data in '{origin}' must be a mapping at the top level")]
    NotAMapping { origin: String },
}

impl StructuredError {
    /// Whether the content was read but is not a valid structured record.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::NotAMapping { .. })
    }
}

/// Reads and parses a TDB file.
///
/// # Errors
///
/// Returns [`TdbError::NotFound`] when `path` does not exist, [`TdbError::Io`] for
/// other read failures, and the parser's error unchanged for malformed content.
pub fn load_database(path: &Path) -> Result<Database, TdbError> {
    debug!("Loading thermodynamic database from {:?}", path);
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            TdbError::NotFound {
                path: path.to_string_lossy().to_string(),
            }
        } else {
            TdbError::Io {
                path: path.to_string_lossy().to_string(),
                source: e,
            }
        }
    })?;
    content.parse()
}

/// Parses YAML from a file or a literal string into a [`StructuredRecord`].
///
/// # Errors
///
/// I/O failures are reported as [`StructuredError::Io`]; syntactically invalid YAML
/// as [`StructuredError::Parse`]; valid YAML that is not a mapping as
/// [`StructuredError::NotAMapping`].
pub fn load_structured(source: &StructuredSource) -> Result<StructuredRecord, StructuredError> {
    let origin = source.describe();
    let owned;
    let text = match source {
        StructuredSource::Path(path) => {
            debug!("Loading structured data from {:?}", path);
            owned = fs::read_to_string(path).map_err(|e| StructuredError::Io {
                path: origin.clone(),
                source: e,
            })?;
            owned.as_str()
        }
        StructuredSource::Text(text) => text.as_str(),
    };

    let value: Value = serde_yaml::from_str(text).map_err(|e| StructuredError::Parse {
        origin: origin.clone(),
        source: e,
    })?;
    StructuredRecord::try_from(value).map_err(|_| StructuredError::NotAMapping { origin })
}
