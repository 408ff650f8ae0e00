//! Directory traversal for archive building.
//!
//! Enumerates the regular files under a source directory, preserving their
//! paths relative to that directory so the archive reproduces the original
//! tree shape on restore.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Options for directory walking
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Follow symbolic links (off by default to avoid cycles)
    pub follow_symlinks: bool,

    /// File name fragments to exclude
    pub exclude_patterns: Vec<String>,
}

/// A regular file discovered during walking
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Full path to the file
    pub path: PathBuf,

    /// Path relative to the walked root
    pub relative_path: PathBuf,

    /// File size in bytes
    pub size: u64,
}

/// Collect every regular file under `root`.
///
/// Directories are traversed but not returned. When symlink following is
/// disabled, symlinks of any kind are skipped entirely; when enabled,
/// walkdir resolves them and broken links surface as errors.
pub fn collect_files(root: &Path, options: &WalkOptions) -> std::io::Result<Vec<FileEntry>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(options.follow_symlinks) {
        let entry = entry.map_err(std::io::Error::other)?;

        if should_exclude(&entry, &options.exclude_patterns) {
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path().to_path_buf();
        let relative_path = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        let size = entry.metadata().map_err(std::io::Error::other)?.len();

        files.push(FileEntry {
            path,
            relative_path,
            size,
        });
    }

    Ok(files)
}

/// Check if a directory entry should be excluded based on patterns
fn should_exclude(entry: &DirEntry, patterns: &[String]) -> bool {
    let file_name = entry.file_name().to_string_lossy();

    for pattern in patterns {
        if file_name.contains(pattern.as_str()) {
            return true;
        }
    }

    false
}
