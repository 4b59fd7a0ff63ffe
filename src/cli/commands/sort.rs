//! Sort command implementation
//!
//! Wires configuration, the HTTP lookup client, the depot classifier and the
//! manifest writer into a [`Pipeline`] and runs it for the requested date.

use super::shared::{generate_report, load_configuration, setup_logging};
use crate::Result;
use crate::app::services::delivery_info::HttpDeliveryInfoClient;
use crate::app::services::depot_classifier::DepotClassifier;
use crate::app::services::enrichment::EnrichmentOptions;
use crate::app::services::json_writer::JsonWriter;
use crate::app::services::pipeline::{Pipeline, PipelineReport};
use crate::cli::args::Args;
use tracing::{debug, info};

/// Sort command runner
///
/// 1. Set up logging and validate arguments
/// 2. Load layered configuration
/// 3. Build the lookup client and classifier
/// 4. Run the pipeline and print the summary
pub async fn run_sort(args: Args) -> Result<PipelineReport> {
    setup_logging(&args)?;

    info!("Starting parcel sorter");
    debug!("Command line arguments: {:?}", args);

    args.validate()?;

    let config = load_configuration(&args)?;
    debug!("Loaded configuration: {:?}", config);

    let source = HttpDeliveryInfoClient::new(&config.lookup)?;
    let classifier = DepotClassifier::from_rules(&config.depots)?;
    let writer = JsonWriter::new(&config.output_dir);
    let options = EnrichmentOptions {
        concurrency: config.lookup.concurrency,
        failure_policy: config.failure_policy,
    };

    let pipeline =
        Pipeline::new(source, classifier, writer, options).with_progress(args.show_progress());

    let report = pipeline.run(&args.csv_path, &args.delivery_date).await?;

    if !args.quiet {
        generate_report(args.output_format, &report)?;
    }

    Ok(report)
}
