//! Loaders for the files an assessment starts from.
//!
//! [`loaders`] reads single files: TDB databases and YAML datasets (from a path or a
//! literal string). [`index`] walks a data directory and gathers every YAML dataset it
//! finds into a [`crate::core::store::DocumentStore`].

pub mod index;
pub mod loaders;

pub use index::{index_directory, index_directory_with_progress};
pub use loaders::{StructuredError, StructuredSource, load_database, load_structured};
