//! Compressed bundle creation and extraction.

pub mod builder;
pub mod extract;

use crate::error::{Result, VaultError};

/// Compression scheme applied over the tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Zstd,
    Gzip,
    None,
}

impl Compression {
    /// Parse the configured scheme identifier.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "zstd" => Ok(Compression::Zstd),
            "gzip" => Ok(Compression::Gzip),
            "none" => Ok(Compression::None),
            other => Err(VaultError::Config(format!(
                "unknown compression scheme: {other}"
            ))),
        }
    }

    /// Archive file extension for this scheme.
    pub fn extension(&self) -> &'static str {
        match self {
            Compression::Zstd => "tar.zst",
            Compression::Gzip => "tar.gz",
            Compression::None => "tar",
        }
    }
}
