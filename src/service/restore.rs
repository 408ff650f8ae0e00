//! Restore engine.
//!
//! Locates a bundle in the catalog, extracts it and cross-checks the
//! restored file count against the manifest recorded at creation time.
//! Read-only with respect to the catalog and ledger.

use super::BackupService;
use crate::archive::extract::extract_archive;
use crate::error::{Result, VaultError};
use crate::models::CatalogEntry;
use std::path::PathBuf;
use tracing::{info, warn};

/// Result of a restore. `verified` is false when the extracted file count
/// differs from the manifest; the restore itself is kept, not rolled back,
/// so a partial restore is surfaced rather than silently accepted.
#[derive(Debug)]
pub struct RestoreOutcome {
    pub bundle_name: String,
    pub target_dir: PathBuf,
    pub files_restored: usize,
    pub verified: bool,
}

impl BackupService {
    /// Restore `bundle_name` into `target_dir`, defaulting to a
    /// `restored_<timestamp>` directory next to the backup root. Unknown
    /// names (or a catalog entry whose archive has vanished) fail with
    /// `NotFound` before any target directory is created.
    pub async fn restore(
        &self,
        bundle_name: &str,
        target_dir: Option<PathBuf>,
    ) -> Result<RestoreOutcome> {
        let entry = self
            .find_entry(bundle_name)
            .await
            .ok_or_else(|| VaultError::NotFound(bundle_name.to_string()))?;

        // Register the in-flight marker before checking the archive:
        // retention holds this lock for its whole pass, so once the marker
        // is in, the bundle cannot be purged out from under the extraction
        self.active_restores
            .lock()
            .await
            .insert(entry.manifest.name.clone());

        let result = if entry.archive_path.exists() {
            self.run_restore(&entry, target_dir).await
        } else {
            Err(VaultError::NotFound(format!(
                "{} (archive missing at {})",
                entry.manifest.name,
                entry.archive_path.display()
            )))
        };
        self.active_restores.lock().await.remove(&entry.manifest.name);

        result
    }

    /// Match on the manifest name or the archive file name; the ledger's
    /// blob names are file names, and callers pass either.
    async fn find_entry(&self, bundle_name: &str) -> Option<CatalogEntry> {
        self.catalog
            .read(|doc| {
                doc.entries
                    .iter()
                    .find(|e| {
                        e.manifest.name == bundle_name
                            || e.archive_path
                                .file_name()
                                .is_some_and(|n| n.to_string_lossy() == bundle_name)
                    })
                    .cloned()
            })
            .await
    }

    async fn run_restore(
        &self,
        entry: &CatalogEntry,
        target_dir: Option<PathBuf>,
    ) -> Result<RestoreOutcome> {
        let target_dir = target_dir.unwrap_or_else(|| self.default_target(entry));
        std::fs::create_dir_all(&target_dir)?;

        info!(
            "Restoring bundle {} to {}",
            entry.manifest.name,
            target_dir.display()
        );

        let archive_path = entry.archive_path.clone();
        let extract_target = target_dir.clone();
        let files_restored = tokio::task::spawn_blocking(move || {
            extract_archive(&archive_path, &extract_target)
        })
        .await
        .map_err(|e| VaultError::Archive(format!("restore task failed: {e}")))??;

        let verified = files_restored == entry.manifest.file_count;
        if verified {
            info!(
                "Restore completed: {} ({} files)",
                entry.manifest.name, files_restored
            );
        } else {
            warn!(
                "Restore verification mismatch for {}: restored {} files, manifest records {}",
                entry.manifest.name, files_restored, entry.manifest.file_count
            );
        }

        Ok(RestoreOutcome {
            bundle_name: entry.manifest.name.clone(),
            target_dir,
            files_restored,
            verified,
        })
    }

    fn default_target(&self, entry: &CatalogEntry) -> PathBuf {
        let stamp = entry.manifest.created_at.format("%Y%m%d_%H%M%S");
        let backup_dir = &self.config.storage.backup_dir;
        backup_dir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(backup_dir)
            .join(format!("restored_{stamp}"))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{seed_source, test_config};
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn round_trip_reproduces_content() -> Result<()> {
        let dir = TempDir::new()?;
        seed_source(dir.path());
        let service = BackupService::open(test_config(dir.path()))?;

        let summary = service.create_backup().await?;
        let target = dir.path().join("restore-target");
        let outcome = service
            .restore(&summary.bundle_name, Some(target.clone()))
            .await?;

        assert!(outcome.verified);
        assert_eq!(outcome.files_restored, summary.manifest.file_count);

        // Trees are rooted at the source directory's base name
        let restored = target.join("data");
        assert_eq!(fs::read(restored.join("a.txt"))?, b"alpha");
        assert_eq!(fs::read(restored.join("nested/b.txt"))?, b"bravo");
        Ok(())
    }

    #[tokio::test]
    async fn restore_accepts_archive_file_name() -> Result<()> {
        let dir = TempDir::new()?;
        seed_source(dir.path());
        let service = BackupService::open(test_config(dir.path()))?;

        let summary = service.create_backup().await?;
        let file_name = summary
            .archive_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();

        let target = dir.path().join("by-file-name");
        let outcome = service.restore(&file_name, Some(target)).await?;
        assert_eq!(outcome.bundle_name, summary.bundle_name);
        Ok(())
    }

    #[tokio::test]
    async fn count_mismatch_is_surfaced_not_rolled_back() -> Result<()> {
        let dir = TempDir::new()?;
        seed_source(dir.path());
        let service = BackupService::open(test_config(dir.path()))?;

        let summary = service.create_backup().await?;

        // Drift: the manifest claims one file more than the archive holds
        service
            .catalog
            .update(|doc| doc.entries.last_mut().unwrap().manifest.file_count += 1)
            .await?;

        let target = dir.path().join("mismatch-target");
        let outcome = service
            .restore(&summary.bundle_name, Some(target.clone()))
            .await?;

        assert!(!outcome.verified);
        assert_eq!(outcome.files_restored, summary.manifest.file_count);

        // The partial restore is kept, not rolled back
        assert_eq!(fs::read(target.join("data/a.txt"))?, b"alpha");
        Ok(())
    }

    #[tokio::test]
    async fn unknown_bundle_is_not_found_and_creates_nothing() -> Result<()> {
        let dir = TempDir::new()?;
        seed_source(dir.path());
        let service = BackupService::open(test_config(dir.path()))?;

        let target = dir.path().join("never-created");
        let err = service
            .restore("does-not-exist", Some(target.clone()))
            .await
            .unwrap_err();

        assert!(matches!(err, VaultError::NotFound(_)));
        assert!(!target.exists());
        Ok(())
    }

    #[tokio::test]
    async fn vanished_archive_is_not_found() -> Result<()> {
        let dir = TempDir::new()?;
        seed_source(dir.path());
        let service = BackupService::open(test_config(dir.path()))?;

        let summary = service.create_backup().await?;
        fs::remove_file(&summary.archive_path)?;

        let target = dir.path().join("never-created");
        let err = service
            .restore(&summary.bundle_name, Some(target.clone()))
            .await
            .unwrap_err();

        assert!(matches!(err, VaultError::NotFound(_)));
        assert!(!target.exists());
        Ok(())
    }
}
