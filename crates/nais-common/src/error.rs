//! Error types for NAIS
//!
//! One error enum shared by every pipeline pass. Variants carry enough
//! context for a user to act on the message without reading the logs.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for NAIS operations
pub type Result<T> = std::result::Result<T, NaisError>;

/// Main error type for NAIS
#[derive(Error, Debug)]
pub enum NaisError {
    /// No file matching a pattern exists under the searched directory
    #[error("No file matching '{pattern}' was found under '{}'.", directory.display())]
    FileNotFound { directory: PathBuf, pattern: String },

    /// A single-file extraction was attempted on a multi-entry archive
    #[error("Archive '{}' contains {entries} entries; expected exactly one.", archive.display())]
    AmbiguousArchive { archive: PathBuf, entries: usize },

    /// The source locator rule is only defined for the 2013 and 2014 releases
    #[error("No source URL rule is defined for year '{0}'. Only 2013 and 2014 are supported.")]
    UnsupportedYear(String),

    /// A download completed with a non-success HTTP status
    #[error("Download of '{url}' failed with HTTP status {status}.")]
    DownloadFailed { url: String, status: u16 },

    /// A named feature class is missing from a store
    #[error("Feature class '{name}' does not exist in store '{}'.", store.display())]
    FeatureClassNotFound { store: PathBuf, name: String },

    /// A feature class is missing a required attribute field
    #[error("Feature class '{class}' has no field '{field}'.")]
    FieldNotFound { class: String, field: String },

    /// The region dataset is missing a requested feature or is malformed
    #[error("Region dataset error: {0}")]
    Region(String),

    /// File system operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("Network request failed: {0}. Check your internet connection.")]
    Http(#[from] reqwest::Error),

    /// Zip archive could not be read or extracted
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// CSV read/write failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NaisError {
    /// Create a file-not-found error
    pub fn file_not_found(directory: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self::FileNotFound {
            directory: directory.into(),
            pattern: pattern.into(),
        }
    }

    /// Create an ambiguous-archive error
    pub fn ambiguous_archive(archive: impl Into<PathBuf>, entries: usize) -> Self {
        Self::AmbiguousArchive {
            archive: archive.into(),
            entries,
        }
    }

    /// Create a region dataset error
    pub fn region(msg: impl Into<String>) -> Self {
        Self::Region(msg.into())
    }
}
