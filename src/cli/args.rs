//! Command-line argument definitions for the parcel sorter
//!
//! Two positional arguments are required: the CSV path and the delivery
//! date. clap prints usage and exits non-zero when either is missing or
//! extra positionals are given.

use crate::constants::DATE_FORMAT;
use crate::{Error, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the parcel sorter
///
/// Sorts one day's parcels into per-depot JSON manifests, grouped by route
/// and ordered by ETA.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "parcel-sorter",
    version,
    about = "Sort a day's parcels into per-depot route manifests",
    long_about = "Reads parcel delivery records from a CSV file, keeps the parcels due on the given \
                  date, looks up each parcel's route and ETA from the parcel lookup service, and \
                  writes one JSON manifest per depot with parcels grouped by route in ETA order.\n\n\
                  The lookup token is read from the PARCEL_LOOKUP_TOKEN environment variable."
)]
pub struct Args {
    /// Path to the parcel CSV file
    #[arg(value_name = "CSV_PATH")]
    pub csv_path: PathBuf,

    /// Delivery date to keep, as YYYY-MM-DD
    ///
    /// Rows are matched by exact string comparison against the
    /// delivery_date column.
    #[arg(value_name = "DATE")]
    pub delivery_date: String,

    /// Directory for depot manifests
    ///
    /// Created if it doesn't exist. Defaults to ./output
    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        help = "Directory for depot manifests"
    )]
    pub output_dir: Option<PathBuf>,

    /// Lookup service base URL (overrides PARCEL_LOOKUP_URL)
    #[arg(long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Per-lookup timeout in seconds
    #[arg(long = "timeout", value_name = "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Number of lookups in flight at once
    ///
    /// Output ordering is unaffected; 1 performs lookups strictly in sequence.
    #[arg(short = 'j', long = "concurrency", value_name = "COUNT")]
    pub concurrency: Option<usize>,

    /// Skip parcels whose lookup fails instead of aborting
    ///
    /// Authorization failures still abort the run.
    #[arg(long = "skip-failed")]
    pub skip_failed: bool,

    /// Path to a JSON configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Format of the summary printed after a run
    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Format of the run summary"
    )]
    pub output_format: OutputFormat,
}

/// Output format options for the run summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

impl Args {
    /// Validate arguments before any processing starts
    pub fn validate(&self) -> Result<()> {
        chrono::NaiveDate::parse_from_str(&self.delivery_date, DATE_FORMAT).map_err(|_| {
            Error::argument(format!(
                "Invalid date '{}': expected YYYY-MM-DD",
                self.delivery_date
            ))
        })?;
        // parse_from_str accepts unpadded fields; the CSV comparison is textual
        if self.delivery_date.len() != 10 {
            return Err(Error::argument(format!(
                "Invalid date '{}': expected YYYY-MM-DD",
                self.delivery_date
            )));
        }

        if !self.csv_path.is_file() {
            return Err(Error::file_not_found(
                self.csv_path.to_string_lossy().to_string(),
            ));
        }

        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(Error::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }

        Ok(())
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}
