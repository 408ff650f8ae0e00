//! Vaultine - local backup/restore engine.
//!
//! Archives configured source directories into versioned compressed bundles,
//! records provenance in a durable catalog, simulates cloud uploads through a
//! local ledger, enforces retention, and restores bundles with verification.

pub mod api;
pub mod archive;
pub mod config;
pub mod error;
pub mod fs;
pub mod models;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, VaultError};
pub use service::BackupService;
