//! Shared components for CLI commands
//!
//! Logging setup, layered configuration loading and run reporting.

use crate::app::services::enrichment::FailurePolicy;
use crate::app::services::pipeline::PipelineReport;
use crate::cli::args::{Args, OutputFormat};
use crate::config::Config;
use crate::{Error, Result};
use colored::Colorize;
use indicatif::HumanDuration;
use tracing::{debug, info};

/// Set up structured logging
pub fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    // Create filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parcel_sorter={}", log_level)));

    if args.quiet {
        // Minimal logging for quiet mode
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .map_err(|e| Error::configuration(format!("Failed to initialise logging: {}", e)))?;
    } else {
        // Standard logging with timestamps
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| Error::configuration(format!("Failed to initialise logging: {}", e)))?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration using layered approach (file -> env -> args)
pub fn load_configuration(args: &Args) -> Result<Config> {
    info!("Loading configuration");

    let mut config = Config::load_layered(args.config_file.as_deref())?;
    apply_cli_overrides(&mut config, args);

    // Final validation
    config.validate()?;

    Ok(config)
}

/// Apply CLI argument overrides to configuration
pub fn apply_cli_overrides(config: &mut Config, args: &Args) {
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(base_url) = &args.base_url {
        config.lookup.base_url = base_url.clone();
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.lookup.timeout_secs = timeout_secs;
    }
    if let Some(concurrency) = args.concurrency {
        config.lookup.concurrency = concurrency;
    }
    if args.skip_failed {
        config.failure_policy = FailurePolicy::SkipRecord;
    }
}

/// Print the run summary in the requested format
pub fn generate_report(format: OutputFormat, report: &PipelineReport) -> Result<()> {
    match format {
        OutputFormat::Human => {
            print!("{}", human_report(report));
            Ok(())
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&json_report(report))
                .map_err(|e| Error::serialization("Failed to serialize run summary", e))?;
            println!("{}", json);
            Ok(())
        }
    }
}

/// Human-readable summary
pub fn human_report(report: &PipelineReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("\n{}\n", "Parcel sorting complete".bright_green().bold()));
    out.push_str(&format!(
        "   • Parcels read: {}\n   • Due on date: {}\n   • Enriched: {}\n",
        report.records_read, report.records_matched, report.enrichment.enriched
    ));
    if !report.enrichment.skipped.is_empty() {
        out.push_str(&format!(
            "   • {} {}\n",
            "Skipped:".yellow(),
            report.enrichment.skipped.len()
        ));
    }
    out.push_str(&format!(
        "   • Processing time: {}\n",
        HumanDuration(report.elapsed)
    ));

    out.push_str(&format!("\n{}\n", "Depots:".bold()));
    for depot in &report.depots {
        out.push_str(&format!(
            "   • {}: {} parcels on {} routes\n",
            depot.depot.name().bright_cyan(),
            depot.parcels,
            depot.routes
        ));
    }

    if !report.manifests.is_empty() {
        out.push_str(&format!("\n{}\n", "Output files:".bold()));
        for manifest in &report.manifests {
            out.push_str(&format!(
                "   • {} ({} bytes)\n",
                manifest.path.display(),
                manifest.bytes
            ));
        }
    }

    out
}

/// Machine-readable summary
pub fn json_report(report: &PipelineReport) -> serde_json::Value {
    serde_json::json!({
        "records_read": report.records_read,
        "records_matched": report.records_matched,
        "enriched": report.enrichment.enriched,
        "skipped": report.enrichment.skipped.iter().map(|s| {
            serde_json::json!({ "parcel_number": s.parcel_number, "reason": s.reason })
        }).collect::<Vec<_>>(),
        "processing_time_seconds": report.elapsed.as_secs_f64(),
        "total_output_size_bytes": report.total_output_size(),
        "depots": report.depots.iter().map(|d| {
            serde_json::json!({ "depot": d.depot.name(), "routes": d.routes, "parcels": d.parcels })
        }).collect::<Vec<_>>(),
        "output_files": report.manifests.iter().map(|m| {
            serde_json::json!({ "path": m.path.to_string_lossy(), "size_bytes": m.bytes })
        }).collect::<Vec<_>>(),
    })
}
