//! Command implementations for the parcel sorter CLI
//!
//! The sorting workflow lives in [`sort`]; logging, configuration loading
//! and reporting helpers are in [`shared`].

pub mod shared;
pub mod sort;

use crate::Result;
use crate::app::services::pipeline::PipelineReport;
use crate::cli::args::Args;

/// Main command runner for the parcel sorter
pub async fn run(args: Args) -> Result<PipelineReport> {
    sort::run_sort(args)
        .await
        .inspect_err(|error| {
            tracing::error!(
                stage = error.stage(),
                "Run failed: {}",
                error.display_chain()
            )
        })
}
