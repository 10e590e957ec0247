//! Reading and atomically replacing the metadata document.

use std::io::Write;
use std::path::{Path, PathBuf};

use filedrop_core::files::{FileError, FileRecord};
use tempfile::NamedTempFile;

/// Reads the document at `path`, creating an empty one when absent.
///
/// A document that exists but does not parse is an error; it is never
/// replaced.
pub(crate) fn load_or_init(path: &Path) -> Result<Vec<FileRecord>, FileError> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(&dir).map_err(|e| persistence_error(&dir, &e))?;

    if !path.exists() {
        write_atomic(path, b"[]")?;
        return Ok(Vec::new());
    }

    let raw = std::fs::read(path).map_err(|e| persistence_error(path, &e))?;
    serde_json::from_slice(&raw).map_err(|e| persistence_error(path, &e))
}

/// Serializes `records` in document form.
pub(crate) fn encode(records: &[FileRecord]) -> Result<Vec<u8>, FileError> {
    serde_json::to_vec_pretty(records).map_err(|e| FileError::persistence(e.to_string()))
}

/// Replaces the document at `path` with `bytes`.
///
/// Readers see either the previous document or the new one, never a
/// partial write.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), FileError> {
    let dir = parent_dir(path);
    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| persistence_error(&dir, &e))?;

    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| persistence_error(tmp.path(), &e))?;
    tmp.persist(path)
        .map_err(|e| persistence_error(path, &e.error))?;
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn persistence_error(path: &Path, err: &dyn std::fmt::Display) -> FileError {
    FileError::persistence(format!("{}: {err}", path.display()))
}
