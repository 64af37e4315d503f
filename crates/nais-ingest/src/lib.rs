//! NAIS Ingest Library
//!
//! Resumable preprocessing pipeline for historical AIS vessel-tracking data
//! published by the NOAA Marine Cadastre portal.
//!
//! # Passes
//!
//! - **Monthly** ([`pipeline::month::MonthRun`]): download one month's archive
//!   for a zone, split the broadcast records by vessel identifier (MMSI),
//!   derive X/Y position fields, and merge each vessel's records into a
//!   shared cross-month store.
//! - **Per-year** ([`pipeline::mmsi::MmsiRun`]): filter every vessel's
//!   cross-month records to the US Exclusive Economic Zone and export the
//!   survivors to CSV tables.
//!
//! Every stage is guarded by an existence check on its completion artifact,
//! so an interrupted run can simply be re-invoked and resumes from the first
//! stage whose artifact is missing.
//!
//! # Example
//!
//! ```no_run
//! use nais_ingest::pipeline::month::MonthRun;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let run = MonthRun::new("./data", "10", "2014", "01")?;
//!     run.preprocess_month().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod locator;
pub mod pipeline;
pub mod region;
pub mod status;
pub mod store;
