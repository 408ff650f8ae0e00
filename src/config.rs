//! Configuration management for the backup engine.
//!
//! Loads configuration from a TOML file; every field has a default so a
//! missing file still yields a working local setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cloud: CloudConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directories whose contents are archived on every backup
    #[serde(default = "default_source_dirs")]
    pub source_dirs: Vec<PathBuf>,

    /// Where compressed bundles and the catalog documents live
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// Bundles strictly older than this many days are purged
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    /// Compression scheme (zstd, gzip, none)
    #[serde(default = "default_compression")]
    pub compression: String,

    /// Compression level (1-22 for zstd)
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,

    /// Follow symbolic links while scanning source directories
    #[serde(default)]
    pub follow_symlinks: bool,

    /// File name fragments excluded from archives
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// Identity fields for the simulated object-storage target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default = "default_container_name")]
    pub container_name: String,

    #[serde(default = "default_storage_account")]
    pub storage_account: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Run the automatic backup loop in serve mode
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,

    /// Seconds between automatic backups
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP port for the status/metrics surface
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_source_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("data/sample_data")]
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_retention_days() -> i64 {
    30
}

fn default_compression() -> String {
    "zstd".to_string()
}

fn default_compression_level() -> i32 {
    3
}

fn default_container_name() -> String {
    "backups".to_string()
}

fn default_storage_account() -> String {
    "backupstorage123".to_string()
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    300
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            source_dirs: default_source_dirs(),
            backup_dir: default_backup_dir(),
            retention_days: default_retention_days(),
            compression: default_compression(),
            compression_level: default_compression_level(),
            follow_symlinks: false,
            exclude_patterns: Vec::new(),
        }
    }
}

impl Default for CloudConfig {
    fn default() -> Self {
        CloudConfig {
            container_name: default_container_name(),
            storage_account: default_storage_account(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            enabled: default_scheduler_enabled(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            port: default_port(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig::default(),
            cloud: CloudConfig::default(),
            scheduler: SchedulerConfig::default(),
            api: ApiConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_setup() {
        let config = Config::default();
        assert_eq!(config.storage.retention_days, 30);
        assert_eq!(config.storage.compression, "zstd");
        assert_eq!(config.cloud.container_name, "backups");
        assert_eq!(config.scheduler.interval_secs, 300);
        assert!(!config.storage.follow_symlinks);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            backup_dir = "/tmp/vaultine-backups"
            retention_days = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.backup_dir, PathBuf::from("/tmp/vaultine-backups"));
        assert_eq!(config.storage.retention_days, 7);
        assert_eq!(config.storage.compression, "zstd");
        assert_eq!(config.api.port, 5000);
    }
}
