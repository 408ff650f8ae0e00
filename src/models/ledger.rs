//! Simulated cloud storage ledger document.
//!
//! Stands in for a remote object store: each "upload" appends a blob record
//! to this document. The ledger carries fixed identity fields for the
//! simulated storage target alongside the blob list.

use crate::models::{bytes_to_mb, round_mb, BundleManifest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerBlob {
    /// Archive file name
    pub blob_name: String,

    pub size_bytes: u64,
    pub size_mb: f64,
    pub uploaded_at: DateTime<Utc>,

    /// Manifest supplied by the caller at upload time
    pub metadata: BundleManifest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudLedger {
    pub container_name: String,
    pub storage_account: String,
    pub created_at: DateTime<Utc>,
    pub blobs: Vec<LedgerBlob>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudStats {
    pub total_blobs: usize,
    pub total_size_mb: f64,
    pub container_name: String,
    pub storage_account: String,
}

impl LedgerBlob {
    pub fn new(blob_name: String, size_bytes: u64, metadata: BundleManifest) -> Self {
        LedgerBlob {
            blob_name,
            size_bytes,
            size_mb: bytes_to_mb(size_bytes),
            uploaded_at: Utc::now(),
            metadata,
        }
    }
}

impl CloudLedger {
    pub fn new(container_name: String, storage_account: String) -> Self {
        CloudLedger {
            container_name,
            storage_account,
            created_at: Utc::now(),
            blobs: Vec::new(),
        }
    }

    /// Blobs ordered most recent first.
    pub fn list(&self) -> Vec<LedgerBlob> {
        let mut blobs = self.blobs.clone();
        blobs.reverse();
        blobs
    }

    pub fn stats(&self) -> CloudStats {
        let total_mb: f64 = self.blobs.iter().map(|b| b.size_mb).sum();
        CloudStats {
            total_blobs: self.blobs.len(),
            total_size_mb: round_mb(total_mb),
            container_name: self.container_name.clone(),
            storage_account: self.storage_account.clone(),
        }
    }
}
