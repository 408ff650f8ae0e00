//! Bundle manifest captured at archive-build time.
//!
//! The manifest is written once when the archive is built and never mutated
//! afterwards; the restore engine compares extracted file counts against it
//! to detect drift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Unique bundle identifier, derived from the creation timestamp
    pub name: String,

    pub created_at: DateTime<Utc>,

    /// Source directories actually included (missing ones are skipped)
    pub source_paths: Vec<PathBuf>,

    /// Regular files written into the archive
    pub file_count: usize,

    /// Uncompressed content size
    pub total_bytes: u64,
}

impl BundleManifest {
    pub fn total_megabytes(&self) -> f64 {
        super::bytes_to_mb(self.total_bytes)
    }
}
