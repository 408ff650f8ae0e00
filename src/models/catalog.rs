//! Local backup catalog document.

use crate::models::{bytes_to_mb, round_mb, BundleManifest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One retained bundle: its manifest plus the compressed archive on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub manifest: BundleManifest,

    /// Location of the compressed bundle
    pub archive_path: PathBuf,

    /// Size of the compressed file itself (distinct from the manifest's
    /// uncompressed `total_bytes`)
    pub archive_size_bytes: u64,
}

/// The catalog as persisted: a single JSON document rewritten in full on
/// every change. Entries are stored in creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub created_at: DateTime<Utc>,
    pub entries: Vec<CatalogEntry>,
}

/// Aggregate view served to the dashboard and metrics consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupStats {
    pub total_backups: usize,
    pub total_size_mb: f64,
    pub latest_backup: String,
}

impl CatalogDocument {
    pub fn new() -> Self {
        CatalogDocument {
            created_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Entries ordered most recent first.
    pub fn list(&self) -> Vec<CatalogEntry> {
        let mut entries = self.entries.clone();
        entries.reverse();
        entries
    }

    pub fn stats(&self) -> BackupStats {
        let total_mb: f64 = self
            .entries
            .iter()
            .map(|e| bytes_to_mb(e.archive_size_bytes))
            .sum();
        BackupStats {
            total_backups: self.entries.len(),
            total_size_mb: round_mb(total_mb),
            latest_backup: self
                .entries
                .last()
                .map(|e| e.manifest.name.clone())
                .unwrap_or_else(|| "none".to_string()),
        }
    }
}

impl Default for CatalogDocument {
    fn default() -> Self {
        Self::new()
    }
}
