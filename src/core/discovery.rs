//! Recursive discovery of input files.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, warn};
use walkdir::WalkDir;

/// Find all files under `root` whose name ends with `.{extension}`.
///
/// Subdirectories are searched recursively and results come back in walk
/// order. Symlinks are not followed.
///
/// # Arguments
///
/// * `root` - Directory to search
/// * `extension` - File extension without the leading dot (e.g. `"txt"`)
///
/// # Returns
///
/// Paths of matching files. If `root` cannot be accessed the failure is
/// logged and an empty vector is returned; unreadable entries further down
/// the tree are logged and skipped.
pub fn find_files(root: &Path, extension: &str) -> Vec<PathBuf> {
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            error!("Cannot search {}: not a directory", root.display());
            return Vec::new();
        }
        Err(e) => {
            error!("An error occurred while accessing the directory {}: {}", root.display(), e);
            return Vec::new();
        }
    }

    let suffix = format!(".{}", extension);

    let files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| name.ends_with(&suffix))
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    debug!("Found {} .{} file(s) under {}", files.len(), extension, root.display());
    files
}
