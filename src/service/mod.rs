//! Backup service orchestration.
//!
//! Composes the archive builder, the two document stores (local catalog and
//! simulated cloud ledger) and the retention enforcer behind the stable
//! operations the scheduler, CLI and HTTP surface call into.

pub mod restore;
pub mod retention;

use crate::archive::builder::{build_archive, BuildOutcome};
use crate::archive::Compression;
use crate::config::Config;
use crate::error::{Result, VaultError};
use crate::fs::walker::WalkOptions;
use crate::models::{
    BackupStats, BundleManifest, CatalogDocument, CatalogEntry, CloudLedger, CloudStats,
    LedgerBlob,
};
use crate::store::DocumentStore;
use chrono::Utc;
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{error, info};

pub use restore::RestoreOutcome;

const CATALOG_FILE: &str = "backup_catalog.json";
const LEDGER_FILE: &str = "cloud_metadata.json";

/// Result of a successful `create_backup`.
#[derive(Debug)]
pub struct BackupSummary {
    pub bundle_name: String,
    pub archive_path: PathBuf,
    pub manifest: BundleManifest,
}

/// Guards bundle-name allocation against clock-resolution collisions
/// under rapid repeated calls.
struct NameAllocator {
    last: String,
    duplicates: u32,
}

pub struct BackupService {
    config: Config,
    catalog: DocumentStore<CatalogDocument>,
    ledger: DocumentStore<CloudLedger>,
    names: Mutex<NameAllocator>,
    /// Bundles with a restore in flight; retention must not purge these
    active_restores: Mutex<HashSet<String>>,
}

impl BackupService {
    /// Open the service over the configured backup root. Failing to create
    /// the root itself is the one unrecoverable error here; everything
    /// later is reported per operation.
    pub fn open(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.storage.backup_dir)?;

        let catalog = DocumentStore::open(
            config.storage.backup_dir.join(CATALOG_FILE),
            CatalogDocument::new,
        )?;
        let ledger = DocumentStore::open(config.storage.backup_dir.join(LEDGER_FILE), || {
            CloudLedger::new(
                config.cloud.container_name.clone(),
                config.cloud.storage_account.clone(),
            )
        })?;

        Ok(BackupService {
            config,
            catalog,
            ledger,
            names: Mutex::new(NameAllocator {
                last: String::new(),
                duplicates: 0,
            }),
            active_restores: Mutex::new(HashSet::new()),
        })
    }

    /// Create one backup: build the archive, record it in the local
    /// catalog, simulate the cloud upload, then enforce retention.
    ///
    /// A failed simulated upload is logged and deliberately NOT rolled
    /// back: the bundle exists locally and stays restorable.
    pub async fn create_backup(&self) -> Result<BackupSummary> {
        let bundle_name = self.allocate_bundle_name().await;
        info!("Starting backup: {bundle_name}");

        let outcome = self.build_bundle(bundle_name.clone()).await?;

        // All-or-nothing: an archive without a catalog entry is unreachable,
        // so drop it if recording fails
        let archive_size_bytes = match self.record_bundle(&outcome).await {
            Ok(size) => size,
            Err(e) => {
                let _ = std::fs::remove_file(&outcome.archive_path);
                return Err(e);
            }
        };

        self.simulate_upload(&outcome, archive_size_bytes).await;

        if let Err(e) = self.enforce_retention().await {
            error!("Retention pass after backup failed: {e}");
        }

        Ok(BackupSummary {
            bundle_name,
            archive_path: outcome.archive_path,
            manifest: outcome.manifest,
        })
    }

    /// Stat the finished archive and append its catalog entry.
    async fn record_bundle(&self, outcome: &BuildOutcome) -> Result<u64> {
        let archive_size_bytes = std::fs::metadata(&outcome.archive_path)?.len();

        let entry = CatalogEntry {
            manifest: outcome.manifest.clone(),
            archive_path: outcome.archive_path.clone(),
            archive_size_bytes,
        };
        self.catalog.update(|doc| doc.entries.push(entry)).await?;
        info!(
            "Backup recorded: {} ({} files, {:.2} MB compressed)",
            outcome.manifest.name,
            outcome.manifest.file_count,
            crate::models::bytes_to_mb(archive_size_bytes)
        );

        Ok(archive_size_bytes)
    }

    async fn build_bundle(&self, name: String) -> Result<BuildOutcome> {
        let compression = Compression::from_name(&self.config.storage.compression)?;
        let level = self.config.storage.compression_level;
        let source_dirs = self.config.storage.source_dirs.clone();
        let destination = self.config.storage.backup_dir.clone();
        let options = WalkOptions {
            follow_symlinks: self.config.storage.follow_symlinks,
            exclude_patterns: self.config.storage.exclude_patterns.clone(),
        };

        tokio::task::spawn_blocking(move || {
            build_archive(&name, &source_dirs, &destination, compression, level, &options)
        })
        .await
        .map_err(|e| VaultError::Archive(format!("archive task failed: {e}")))?
    }

    /// Append the bundle to the simulated cloud ledger. Failure is logged,
    /// never propagated (see `create_backup`).
    async fn simulate_upload(&self, outcome: &BuildOutcome, archive_size_bytes: u64) {
        let blob_name = outcome
            .archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| outcome.manifest.name.clone());

        info!("Simulating cloud upload: {blob_name}");
        let blob = LedgerBlob::new(blob_name.clone(), archive_size_bytes, outcome.manifest.clone());

        match self.ledger.update(|doc| doc.blobs.push(blob)).await {
            Ok(()) => info!("Cloud upload simulated successfully: {blob_name}"),
            Err(e) => error!(
                "Cloud upload simulation failed for {blob_name}: {e}; bundle remains restorable locally"
            ),
        }
    }

    /// Bundle names are timestamp-derived with millisecond precision; a
    /// duplicate counter keeps them unique when the clock hasn't advanced
    /// between calls.
    async fn allocate_bundle_name(&self) -> String {
        let mut names = self.names.lock().await;
        let candidate = format!("backup_{}", Utc::now().format("%Y%m%d_%H%M%S%3f"));

        if candidate == names.last {
            names.duplicates += 1;
            return format!("{candidate}_{}", names.duplicates);
        }

        names.last = candidate.clone();
        names.duplicates = 0;
        candidate
    }

    /// Retained bundles, most recent first.
    pub async fn list_backups(&self) -> Vec<CatalogEntry> {
        self.catalog.read(|doc| doc.list()).await
    }

    pub async fn backup_stats(&self) -> BackupStats {
        self.catalog.read(|doc| doc.stats()).await
    }

    /// Simulated cloud blobs, most recent first.
    pub async fn list_blobs(&self) -> Vec<LedgerBlob> {
        self.ledger.read(|doc| doc.list()).await
    }

    pub async fn cloud_stats(&self) -> CloudStats {
        self.ledger.read(|doc| doc.stats()).await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
