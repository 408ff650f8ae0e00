//! Archive builder.
//!
//! Walks the configured source directories and writes one compressed tar
//! bundle, accumulating the manifest (file count, total bytes) as files are
//! added. Entries are rooted at each source directory's base name so a
//! restore reconstructs the original tree shape under each source root.

use crate::archive::Compression;
use crate::error::Result;
use crate::fs::walker::{collect_files, WalkOptions};
use crate::models::BundleManifest;
use chrono::Utc;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of a successful build: the archive on disk plus its manifest.
#[derive(Debug)]
pub struct BuildOutcome {
    pub archive_path: PathBuf,
    pub manifest: BundleManifest,
}

/// Build one bundle named `name` under `destination_dir`.
///
/// Missing source directories are skipped with a warning and excluded from
/// the manifest's `source_paths`. Zero files is not an error: the bundle is
/// written empty. Any I/O failure aborts the build and removes the partial
/// archive, so a returned `Ok` always refers to a complete, flushed file.
pub fn build_archive(
    name: &str,
    source_dirs: &[PathBuf],
    destination_dir: &Path,
    compression: Compression,
    level: i32,
    options: &WalkOptions,
) -> Result<BuildOutcome> {
    let archive_path = destination_dir.join(format!("{name}.{}", compression.extension()));

    match write_bundle(name, source_dirs, &archive_path, compression, level, options) {
        Ok(manifest) => Ok(BuildOutcome {
            archive_path,
            manifest,
        }),
        Err(e) => {
            let _ = std::fs::remove_file(&archive_path);
            Err(e)
        }
    }
}

fn write_bundle(
    name: &str,
    source_dirs: &[PathBuf],
    archive_path: &Path,
    compression: Compression,
    level: i32,
    options: &WalkOptions,
) -> Result<BundleManifest> {
    let created_at = Utc::now();
    let file = File::create(archive_path)?;

    let (file, source_paths, file_count, total_bytes) = match compression {
        Compression::Zstd => {
            let encoder = zstd::stream::write::Encoder::new(file, level)?;
            let mut tar = tar::Builder::new(encoder);
            let (paths, count, bytes) = append_sources(&mut tar, source_dirs, options)?;
            let file = tar.into_inner()?.finish()?;
            (file, paths, count, bytes)
        }
        Compression::Gzip => {
            let gz_level = flate2::Compression::new(level.clamp(0, 9) as u32);
            let encoder = flate2::write::GzEncoder::new(file, gz_level);
            let mut tar = tar::Builder::new(encoder);
            let (paths, count, bytes) = append_sources(&mut tar, source_dirs, options)?;
            let file = tar.into_inner()?.finish()?;
            (file, paths, count, bytes)
        }
        Compression::None => {
            let mut tar = tar::Builder::new(file);
            let (paths, count, bytes) = append_sources(&mut tar, source_dirs, options)?;
            let file = tar.into_inner()?;
            (file, paths, count, bytes)
        }
    };

    // The archive must be durable before the manifest is handed out
    file.sync_all()?;

    info!(
        "Archive written: {} ({} files, {} bytes)",
        archive_path.display(),
        file_count,
        total_bytes
    );

    Ok(BundleManifest {
        name: name.to_string(),
        created_at,
        source_paths,
        file_count,
        total_bytes,
    })
}

/// Append every regular file under each source directory, rooted at the
/// directory's base name. Returns the included source paths (absolute) and
/// the accumulated file count and byte total.
fn append_sources<W: Write>(
    tar: &mut tar::Builder<W>,
    source_dirs: &[PathBuf],
    options: &WalkOptions,
) -> Result<(Vec<PathBuf>, usize, u64)> {
    let mut source_paths = Vec::new();
    let mut file_count = 0usize;
    let mut total_bytes = 0u64;

    for dir in source_dirs {
        if !dir.is_dir() {
            warn!("Source directory missing, skipping: {}", dir.display());
            continue;
        }

        let root_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string());

        for entry in collect_files(dir, options)? {
            let archived_name = Path::new(&root_name).join(&entry.relative_path);
            tar.append_path_with_name(&entry.path, &archived_name)?;
            file_count += 1;
            total_bytes += entry.size;
        }

        source_paths.push(dir.canonicalize().unwrap_or_else(|_| dir.clone()));
    }

    if file_count == 0 {
        info!("No files found under source directories; writing an empty bundle");
    }

    Ok((source_paths, file_count, total_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn options() -> WalkOptions {
        WalkOptions::default()
    }

    #[test]
    fn builds_manifest_matching_written_files() -> Result<()> {
        let src = TempDir::new()?;
        let dst = TempDir::new()?;
        fs::write(src.path().join("a.txt"), b"hello")?;
        fs::create_dir(src.path().join("nested"))?;
        fs::write(src.path().join("nested/b.txt"), b"world!!")?;

        let outcome = build_archive(
            "backup_test",
            &[src.path().to_path_buf()],
            dst.path(),
            Compression::Zstd,
            3,
            &options(),
        )?;

        assert!(outcome.archive_path.exists());
        assert!(outcome
            .archive_path
            .to_string_lossy()
            .ends_with("backup_test.tar.zst"));
        assert_eq!(outcome.manifest.file_count, 2);
        assert_eq!(outcome.manifest.total_bytes, 12);
        assert_eq!(outcome.manifest.source_paths.len(), 1);
        Ok(())
    }

    #[test]
    fn empty_source_yields_valid_empty_bundle() -> Result<()> {
        let src = TempDir::new()?;
        let dst = TempDir::new()?;

        let outcome = build_archive(
            "backup_empty",
            &[src.path().to_path_buf()],
            dst.path(),
            Compression::Gzip,
            6,
            &options(),
        )?;

        assert!(outcome.archive_path.exists());
        assert_eq!(outcome.manifest.file_count, 0);
        assert_eq!(outcome.manifest.total_bytes, 0);
        Ok(())
    }

    #[test]
    fn missing_source_dir_is_skipped_not_fatal() -> Result<()> {
        let src = TempDir::new()?;
        let dst = TempDir::new()?;
        fs::write(src.path().join("kept.txt"), b"kept")?;
        let missing = src.path().join("does-not-exist");

        let outcome = build_archive(
            "backup_skip",
            &[missing, src.path().to_path_buf()],
            dst.path(),
            Compression::None,
            0,
            &options(),
        )?;

        assert_eq!(outcome.manifest.file_count, 1);
        assert_eq!(outcome.manifest.source_paths.len(), 1);
        Ok(())
    }
}
