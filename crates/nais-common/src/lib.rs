//! NAIS Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities and error handling for the NAIS preprocessing pipeline.
//!
//! # Overview
//!
//! This crate provides the leaf functionality every pipeline pass relies on:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Files**: Folder creation, recursive file search, zip extraction
//! - **Download**: HTTP download of source archives to a temp file
//! - **Logging**: Centralized tracing configuration
//!
//! # Example
//!
//! ```no_run
//! use nais_common::{Result, files};
//!
//! fn locate_archive(downloads: &std::path::Path) -> Result<std::path::PathBuf> {
//!     files::find_file(downloads, "World_EEZ")
//! }
//! ```

pub mod download;
pub mod error;
pub mod files;
pub mod logging;

// Re-export commonly used types
pub use error::{NaisError, Result};
