//! Data model for bundles, the local catalog and the simulated cloud ledger.

pub mod catalog;
pub mod ledger;
pub mod manifest;

pub use catalog::{BackupStats, CatalogDocument, CatalogEntry};
pub use ledger::{CloudLedger, CloudStats, LedgerBlob};
pub use manifest::BundleManifest;

/// Convert a byte count to megabytes, rounded to two decimals.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    round_mb(bytes as f64 / (1024.0 * 1024.0))
}

pub(crate) fn round_mb(mb: f64) -> f64 {
    (mb * 100.0).round() / 100.0
}
