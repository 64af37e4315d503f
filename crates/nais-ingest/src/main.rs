//! NAIS Ingest - AIS preprocessing tool

use anyhow::Result;
use clap::{Parser, Subcommand};
use nais_common::logging::{init_logging, LogConfig, LogLevel};
use nais_ingest::config::Config;
use nais_ingest::pipeline::mmsi::MmsiRun;
use nais_ingest::pipeline::month::MonthRun;
use nais_ingest::pipeline::prompt::ConsolePrompt;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "nais-ingest")]
#[command(author, version, about = "NAIS AIS data preprocessing tool")]
struct Cli {
    /// Pipeline pass to run
    #[command(subcommand)]
    pass: Pass,

    /// Data root directory (overrides NAIS_DATA_ROOT)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Pass {
    /// Preprocess one month of raw data for a zone
    Month {
        /// Zone code, e.g. 10
        #[arg(short, long)]
        zone: String,

        /// Year, e.g. 2014
        #[arg(short, long)]
        year: String,

        /// Two-digit month, e.g. 01
        #[arg(short, long)]
        month: String,

        /// Keep only vessels with both stopped and moving records
        #[arg(long)]
        stop_and_go_only: bool,
    },

    /// Filter a year's cross-month records to the US EEZ and export CSV tables
    Mmsi {
        /// Zone code, e.g. 10
        #[arg(short, long)]
        zone: String,

        /// Year, e.g. 2014
        #[arg(short, long)]
        year: String,
    },

    /// Run all twelve months of a year, then the cross-month pass
    Run {
        /// Zone code, e.g. 10
        #[arg(short, long)]
        zone: String,

        /// Year, e.g. 2014
        #[arg(short, long)]
        year: String,

        /// Keep only vessels with both stopped and moving records
        #[arg(long)]
        stop_and_go_only: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables override individual settings when set
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("nais-ingest".to_string())
        .build()
        .apply_env()?;

    init_logging(&log_config)?;

    let mut config = Config::from_env()?;
    if let Some(root) = cli.root {
        config.set_data_root(root);
    }

    match cli.pass {
        Pass::Month {
            zone,
            year,
            month,
            stop_and_go_only,
        } => {
            info!("Preprocessing zone {zone}, {year}-{month}");
            let mut run = MonthRun::new(&config.data_root, &zone, &year, &month)?;
            if stop_and_go_only {
                run = run.with_stop_and_go_filter();
            }
            run.preprocess_month().await?;
        },
        Pass::Mmsi { zone, year } => {
            info!("Preprocessing cross-month records for zone {zone}, {year}");
            let run = MmsiRun::new(&config.data_root, &zone, &year, &config.downloads_dir)?;
            run.preprocess_mmsi(&ConsolePrompt)?;
        },
        Pass::Run {
            zone,
            year,
            stop_and_go_only,
        } => {
            for month in (1..=12).map(|m| format!("{m:02}")) {
                info!("Preprocessing zone {zone}, {year}-{month}");
                let mut run = MonthRun::new(&config.data_root, &zone, &year, &month)?;
                if stop_and_go_only {
                    run = run.with_stop_and_go_filter();
                }
                run.preprocess_month().await?;
            }

            info!("Preprocessing cross-month records for zone {zone}, {year}");
            let run = MmsiRun::new(&config.data_root, &zone, &year, &config.downloads_dir)?;
            run.preprocess_mmsi(&ConsolePrompt)?;
        },
    }

    info!("Preprocessing complete");
    Ok(())
}
