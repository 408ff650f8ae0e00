//! Retention enforcement.
//!
//! Purges bundles strictly older than the configured window: the archive
//! file, its catalog entry and its cloud-ledger blob are removed together.
//! Bundles with a restore in flight are left alone for this pass.

use super::BackupService;
use crate::error::Result;
use crate::models::CatalogEntry;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use tracing::{info, warn};

impl BackupService {
    /// Run one retention pass. Idempotent: with nothing newly aged this
    /// purges nothing and returns 0.
    pub async fn enforce_retention(&self) -> Result<usize> {
        let cutoff = Utc::now() - Duration::days(self.config.storage.retention_days);
        self.purge_older_than(cutoff).await
    }

    /// Purge every bundle whose `created_at` is strictly before `cutoff`.
    /// A bundle created exactly at the cutoff is retained.
    pub(crate) async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        // Held across the whole pass: a restore registers its marker under
        // this same lock, so it either lands before the expiry scan or
        // waits until the purge is done
        let in_restore = self.active_restores.lock().await;

        let expired: Vec<CatalogEntry> = self
            .catalog
            .read(|doc| {
                doc.entries
                    .iter()
                    .filter(|entry| {
                        entry.manifest.created_at < cutoff
                            && !in_restore.contains(&entry.manifest.name)
                    })
                    .cloned()
                    .collect()
            })
            .await;

        if expired.is_empty() {
            return Ok(0);
        }

        // Unlink first; catalog/ledger entries are dropped only for bundles
        // whose archive is confirmed gone, so a failed unlink never leaves
        // an orphaned file without its records
        let mut purged_names = HashSet::new();
        let mut blob_names = HashSet::new();
        for entry in &expired {
            match std::fs::remove_file(&entry.archive_path) {
                Ok(()) => info!("Purged expired bundle: {}", entry.manifest.name),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    // Drift: the file is already gone, drop the stale entries anyway
                    warn!(
                        "Archive already missing for {}; removing stale catalog/ledger entries",
                        entry.manifest.name
                    );
                }
                Err(e) => {
                    warn!(
                        "Failed to remove archive {}: {e}; keeping its entries for the next pass",
                        entry.archive_path.display()
                    );
                    continue;
                }
            }

            purged_names.insert(entry.manifest.name.clone());
            if let Some(name) = entry.archive_path.file_name() {
                blob_names.insert(name.to_string_lossy().into_owned());
            }
        }

        if purged_names.is_empty() {
            return Ok(0);
        }

        self.catalog
            .update(|doc| {
                doc.entries
                    .retain(|e| !purged_names.contains(&e.manifest.name))
            })
            .await?;
        self.ledger
            .update(|doc| doc.blobs.retain(|b| !blob_names.contains(&b.blob_name)))
            .await?;

        info!(
            "Retention pass complete: {} bundle(s) purged",
            purged_names.len()
        );
        Ok(purged_names.len())
    }
}
