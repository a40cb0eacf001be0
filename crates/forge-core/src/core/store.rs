//! Ordered, persistable collection of structured records.
//!
//! Records are kept in insertion order under auto-incrementing document ids starting
//! at 1. A store is persisted as a single JSON file using a TinyDB-compatible layout,
//! `{"_default": {"1": {...}, "2": {...}}}`, so datasets written by other tooling in
//! that format can be reopened directly.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

pub type DocId = u64;

/// A mapping from string keys to arbitrary nested values.
///
/// The top level is always a mapping; scalars and sequences are only valid as values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredRecord(Map<String, Value>);

impl StructuredRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Looks up a nested value by JSON pointer, e.g. `/conditions/T`.
    ///
    /// `~1` and `~0` in any segment stand for `/` and `~`.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        let path = pointer.strip_prefix('/')?;
        let (head, rest) = match path.split_once('/') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let value = self.0.get(&head.replace("~1", "/").replace("~0", "~"))?;
        match rest {
            None => Some(value),
            Some(rest) => value.pointer(&format!("/{}", rest)),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

}

impl From<Map<String, Value>> for StructuredRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for StructuredRecord {
    type Error = Value;

    /// Fails with the original value when it is not a mapping.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File I/O error for '{path}': {source}")]
    Io { path: String, source: io::Error },
    #[error("JSON error for '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Serialize, Deserialize, Default)]
struct StoreFile {
    #[serde(rename = "_default", default)]
    table: BTreeMap<DocId, StructuredRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStore {
    documents: BTreeMap<DocId, StructuredRecord>,
    next_id: DocId,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self {
            documents: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: StructuredRecord) -> DocId {
        let id = self.next_id;
        self.documents.insert(id, record);
        self.next_id += 1;
        id
    }

    pub fn insert_all(&mut self, records: impl IntoIterator<Item = StructuredRecord>) -> Vec<DocId> {
        records.into_iter().map(|r| self.insert(r)).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: DocId) -> Option<&StructuredRecord> {
        self.documents.get(&id)
    }

    /// Iterates over `(id, record)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (DocId, &StructuredRecord)> {
        self.documents.iter().map(|(id, r)| (*id, r))
    }

    pub fn records(&self) -> impl Iterator<Item = &StructuredRecord> {
        self.documents.values()
    }

    pub fn search<F>(&self, predicate: F) -> Vec<&StructuredRecord>
    where
        F: Fn(&StructuredRecord) -> bool,
    {
        self.documents.values().filter(|r| predicate(r)).collect()
    }

    /// Records whose top-level `key` equals `value`.
    pub fn search_field(&self, key: &str, value: &Value) -> Vec<&StructuredRecord> {
        self.search(|r| r.get(key) == Some(value))
    }

    /// Records whose value at the JSON `pointer` equals `value`.
    pub fn search_pointer(&self, pointer: &str, value: &Value) -> Vec<&StructuredRecord> {
        self.search(|r| r.pointer(pointer) == Some(value))
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        let file = StoreFile {
            table: self.documents.clone(),
        };
        serde_json::to_string_pretty(&file)
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let content = self.to_json_string().map_err(|e| StoreError::Json {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        fs::write(path, content).map_err(|e| StoreError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        debug!("Persisted {} document(s) to {:?}", self.len(), path);
        Ok(())
    }

    /// Opens a persisted store; a missing file opens as an empty store.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => {
                return Err(StoreError::Io {
                    path: path.to_string_lossy().to_string(),
                    source: e,
                });
            }
        };
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        let file: StoreFile = serde_json::from_str(&content).map_err(|e| StoreError::Json {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let next_id = file.table.keys().next_back().map_or(1, |last| last + 1);
        Ok(Self {
            documents: file.table,
            next_id,
        })
    }
}

impl FromIterator<StructuredRecord> for DocumentStore {
    fn from_iter<I: IntoIterator<Item = StructuredRecord>>(iter: I) -> Self {
        let mut store = Self::new();
        store.insert_all(iter);
        store
    }
}
