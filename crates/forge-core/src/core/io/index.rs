use super::loaders::{StructuredError, StructuredSource, load_structured};
use crate::core::store::DocumentStore;
use crate::engine::progress::{Progress, ProgressReporter};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DATA_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

fn is_data_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DATA_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

fn collect_recursive(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), StructuredError> {
    let io_error = |e: std::io::Error| StructuredError::Io {
        path: dir.to_string_lossy().to_string(),
        source: e,
    };
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let path = entry.path();
        // Symlinked directories are not followed.
        if entry.file_type().map_err(io_error)?.is_dir() {
            collect_recursive(&path, out)?;
        } else if is_data_file(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// Lists the structured data files below `dir`, recursively and sorted by path.
///
/// A missing directory, or a path that is not a directory, yields an empty list.
pub fn collect_data_files(dir: &Path) -> Result<Vec<PathBuf>, StructuredError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    collect_recursive(dir, &mut files)?;
    files.sort();
    Ok(files)
}

pub fn index_directory(dir: &Path) -> Result<DocumentStore, StructuredError> {
    index_directory_with_progress(dir, &ProgressReporter::new())
}

/// Loads every structured data file below `dir` into a fresh [`DocumentStore`].
///
/// Absence is tolerated: a missing or non-directory path, or a directory without
/// matching files, produces an empty store. Content is not: a file that is found but
/// cannot be read or parsed fails the whole call.
pub fn index_directory_with_progress(
    dir: &Path,
    reporter: &ProgressReporter,
) -> Result<DocumentStore, StructuredError> {
    if !dir.is_dir() {
        warn!(
            "Data directory {:?} does not exist or is not a directory; using an empty store.",
            dir
        );
        return Ok(DocumentStore::new());
    }

    let files = collect_data_files(dir)?;
    debug!("Found {} structured data file(s) in {:?}", files.len(), dir);

    reporter.report(Progress::TaskStart {
        total_steps: files.len() as u64,
    });
    let mut store = DocumentStore::new();
    for file in &files {
        let record = load_structured(&StructuredSource::path(file))?;
        store.insert(record);
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);

    info!("Indexed {} dataset(s) from {:?}", store.len(), dir);
    Ok(store)
}
