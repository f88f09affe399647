//! Output file naming and directory preparation.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while preparing output locations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create the output directory.
    #[error("failed to create output directory '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Output path exists but is not a directory.
    #[error("output path '{0}' is not a directory")]
    NotADirectory(String),
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates the output directory if it doesn't exist.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    if dir.exists() {
        if !dir.is_dir() {
            return Err(WriteError::NotADirectory(dir.display().to_string()));
        }
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| WriteError::CreateDirectory {
        path: dir.display().to_string(),
        source: e,
    })
}

/// Derive the image path for an input file.
///
/// The input's file stem gets `extension` appended and is placed in
/// `output_dir`; `data/sample.txt` with `svg` becomes `{output_dir}/sample.svg`.
/// An existing file at that path is overwritten by the renderer.
pub fn output_path(input: &Path, output_dir: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "plot".to_string());
    output_dir.join(format!("{}.{}", stem, extension))
}
