//! Archive extraction and inspection.

use crate::error::{Result, VaultError};
use std::fs::File;
use std::io::Read;
use std::path::Path;

fn open_reader(archive_path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(archive_path)?;
    let name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if name.ends_with(".tar.zst") {
        Ok(Box::new(zstd::stream::read::Decoder::new(file)?))
    } else if name.ends_with(".tar.gz") {
        Ok(Box::new(flate2::read::GzDecoder::new(file)))
    } else if name.ends_with(".tar") {
        Ok(Box::new(file))
    } else {
        Err(VaultError::Archive(format!(
            "unsupported archive format: {name}"
        )))
    }
}

/// Extract every entry of the bundle under `target_dir`, preserving the
/// relative paths captured at build time. Returns the number of regular
/// files written.
pub fn extract_archive(archive_path: &Path, target_dir: &Path) -> Result<usize> {
    let mut archive = tar::Archive::new(open_reader(archive_path)?);
    let mut restored = 0usize;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let is_file = entry.header().entry_type().is_file();
        // unpack_in refuses paths escaping the target directory
        if entry.unpack_in(target_dir)? && is_file {
            restored += 1;
        }
    }

    Ok(restored)
}

/// Re-scan a bundle for its file count and uncompressed byte total,
/// independent of the manifest recorded at creation time.
pub fn scan_bundle(archive_path: &Path) -> Result<(usize, u64)> {
    let mut archive = tar::Archive::new(open_reader(archive_path)?);
    let mut files = 0usize;
    let mut bytes = 0u64;

    for entry in archive.entries()? {
        let entry = entry?;
        if entry.header().entry_type().is_file() {
            files += 1;
            bytes += entry.header().size()?;
        }
    }

    Ok((files, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::builder::build_archive;
    use crate::archive::Compression;
    use crate::fs::walker::WalkOptions;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn extracted_tree_matches_source() -> Result<()> {
        let src = TempDir::new()?;
        let dst = TempDir::new()?;
        let out = TempDir::new()?;
        fs::create_dir(src.path().join("docs"))?;
        fs::write(src.path().join("a.bin"), b"\x00\x01\x02")?;
        fs::write(src.path().join("docs/b.txt"), b"restore me")?;

        let outcome = build_archive(
            "backup_rt",
            &[src.path().to_path_buf()],
            dst.path(),
            Compression::Zstd,
            3,
            &WalkOptions::default(),
        )?;

        let restored = extract_archive(&outcome.archive_path, out.path())?;
        assert_eq!(restored, outcome.manifest.file_count);

        let root_name = src.path().file_name().unwrap();
        let restored_file = out.path().join(root_name).join("docs/b.txt");
        assert_eq!(fs::read(restored_file)?, b"restore me");
        Ok(())
    }

    #[test]
    fn scan_recovers_totals_without_manifest() -> Result<()> {
        let src = TempDir::new()?;
        let dst = TempDir::new()?;
        fs::write(src.path().join("one.txt"), b"12345")?;
        fs::write(src.path().join("two.txt"), b"123")?;

        let outcome = build_archive(
            "backup_scan",
            &[src.path().to_path_buf()],
            dst.path(),
            Compression::Gzip,
            6,
            &WalkOptions::default(),
        )?;

        let (files, bytes) = scan_bundle(&outcome.archive_path)?;
        assert_eq!(files, outcome.manifest.file_count);
        assert_eq!(bytes, outcome.manifest.total_bytes);
        Ok(())
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = extract_archive(Path::new("/tmp/backup_x.zip"), Path::new("/tmp")).unwrap_err();
        assert!(matches!(err, VaultError::Io(_) | VaultError::Archive(_)));
    }
}
