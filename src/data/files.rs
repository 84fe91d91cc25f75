//! Atomic file output
//!
//! Content is written to a temporary file in the destination directory and
//! renamed over the target, so readers see either the old file or the new one.

use polars::prelude::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::PipelineError;

/// Write `content` to `path` via temp file and rename. Parent directories are
/// created as needed.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), PipelineError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PipelineError::io(dir, e))?;
    tmp.write_all(content)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| PipelineError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| PipelineError::io(path, e.error))?;

    Ok(())
}

/// Serialize a frame as CSV with a header row and write it atomically
pub fn write_frame_atomic(path: &Path, df: &mut DataFrame) -> Result<(), PipelineError> {
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf).include_header(true).finish(df)?;
    atomic_write(path, &buf)
}
