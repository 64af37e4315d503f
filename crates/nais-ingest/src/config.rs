//! Configuration for the NAIS ingest tools
//!
//! Handles the data root and the browser downloads directory used by the
//! one-time EEZ acquisition step.

use nais_common::error::{NaisError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default data root when not specified via environment variable or flag.
pub const DEFAULT_DATA_ROOT: &str = "./data";

/// Ingest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory for all downloaded and derived artifacts
    pub data_root: PathBuf,

    /// Directory the browser saves manual downloads to (EEZ acquisition)
    pub downloads_dir: PathBuf,
}

impl Config {
    /// Create a new config with default values
    pub fn new() -> Result<Self> {
        let downloads_dir = dirs::download_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
            .ok_or_else(|| {
                NaisError::Other(anyhow::anyhow!("Could not determine downloads directory"))
            })?;

        Ok(Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            downloads_dir,
        })
    }

    /// Load config from environment variables
    ///
    /// - `NAIS_DATA_ROOT`: root directory for pipeline artifacts
    /// - `NAIS_DOWNLOADS_DIR`: browser downloads directory
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new()?;

        if let Ok(root) = std::env::var("NAIS_DATA_ROOT") {
            config.data_root = PathBuf::from(root);
        }

        if let Ok(downloads) = std::env::var("NAIS_DOWNLOADS_DIR") {
            config.downloads_dir = PathBuf::from(downloads);
        }

        Ok(config)
    }

    /// Set the data root
    pub fn set_data_root(&mut self, root: PathBuf) {
        self.data_root = root;
    }
}

impl Default for Config {
    fn default() -> Self {
        // Without a resolvable downloads directory, fall back to a local one
        Self::new().unwrap_or_else(|_| Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            downloads_dir: PathBuf::from("./downloads"),
        })
    }
}
