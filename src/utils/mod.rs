//! Utility modules for the backup engine.

pub mod logger;
