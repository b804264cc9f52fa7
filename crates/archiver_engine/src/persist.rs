use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The target already existed; nothing was touched.
    Skipped,
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    // Writability probe; the temp file is removed on drop.
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Whole-file write that never replaces an existing file.
///
/// Content lands in a temp file beside `target` and is renamed into place
/// without clobbering, so readers see either nothing or the complete file.
/// Losing the rename race to another writer counts as [`WriteOutcome::Skipped`].
pub fn write_new(target: &Path, content: &[u8]) -> Result<WriteOutcome, PersistError> {
    if target.exists() {
        return Ok(WriteOutcome::Skipped);
    }
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;

    match tmp.persist_noclobber(target) {
        Ok(_) => Ok(WriteOutcome::Written),
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => Ok(WriteOutcome::Skipped),
        Err(err) => Err(PersistError::Io(err.error)),
    }
}
