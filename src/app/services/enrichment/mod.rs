//! Enrichment and depot partitioning
//!
//! Takes the date-filtered parcel records in input order, looks up each
//! parcel's route and ETA, and appends the enriched parcel to the bucket of
//! the depot its postcode classifies into.
//!
//! # Ordering
//!
//! Lookups are driven through an order-preserving buffered stream. With the
//! default concurrency of 1 they run strictly one after another; with more
//! in flight, results are still consumed in input order, so every bucket
//! holds its members in the same relative order as the input.
//!
//! # Failure policy
//!
//! Under [`FailurePolicy::Abort`] the first failed lookup aborts the stage and
//! no buckets are returned. [`FailurePolicy::SkipRecord`] logs and drops
//! parcels whose lookup failed, except for authorization failures which
//! always abort.

pub mod buckets;


pub use buckets::DepotBuckets;

use crate::Result;
use crate::app::models::{DepotId, ParcelRecord};
use crate::app::services::delivery_info::DeliveryInfoSource;
use crate::app::services::depot_classifier::DepotClassifier;
use crate::constants::DEFAULT_LOOKUP_CONCURRENCY;
use futures::StreamExt;
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Reaction to a failed lookup for a single parcel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the whole run on the first failure
    #[default]
    Abort,
    /// Drop the parcel and continue; authorization failures still abort
    SkipRecord,
}

/// Tuning for the enrichment stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentOptions {
    /// Lookups in flight at once
    pub concurrency: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for EnrichmentOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_LOOKUP_CONCURRENCY,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

/// A parcel dropped under [`FailurePolicy::SkipRecord`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedParcel {
    pub parcel_number: String,
    pub reason: String,
}

/// Statistics for one enrichment pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    /// Records handed to the stage
    pub records_in: usize,
    /// Records successfully enriched and bucketed
    pub enriched: usize,
    /// Records dropped after a failed lookup
    pub skipped: Vec<SkippedParcel>,
    /// Parcels per depot, in depot order
    pub per_depot: Vec<(DepotId, usize)>,
}

/// Buckets plus the statistics describing how they were built
#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    pub buckets: DepotBuckets,
    pub stats: EnrichmentStats,
}

/// Enrich every record and partition it into its depot bucket
///
/// # Arguments
///
/// * `records` - Date-filtered records in input order
/// * `source` - Lookup service for route and ETA
/// * `classifier` - Postcode to depot rules
/// * `options` - Concurrency and failure policy
/// * `progress` - Optional progress bar advanced once per record
///
/// # Errors
///
/// Returns [`crate::Error::Lookup`] for the first failed lookup under
/// [`FailurePolicy::Abort`], or for any authorization failure.
pub async fn enrich_and_partition<S>(
    records: Vec<ParcelRecord>,
    source: &S,
    classifier: &DepotClassifier,
    options: EnrichmentOptions,
    progress: Option<&ProgressBar>,
) -> Result<EnrichmentOutcome>
where
    S: DeliveryInfoSource,
{
    let mut stats = EnrichmentStats {
        records_in: records.len(),
        ..Default::default()
    };
    let mut buckets = DepotBuckets::new();

    info!(
        "Enriching {} parcels ({} lookups in flight)",
        records.len(),
        options.concurrency.max(1)
    );

    let lookups = futures::stream::iter(records)
        .map(|record| async move {
            let outcome = source.fetch(&record.parcel_number).await;
            (record, outcome)
        })
        .buffered(options.concurrency.max(1));
    let mut lookups = std::pin::pin!(lookups);

    while let Some((record, outcome)) = lookups.next().await {
        if let Some(progress) = progress {
            progress.inc(1);
        }

        let info = match outcome {
            Ok(info) => info,
            Err(error) if error.is_auth() || options.failure_policy == FailurePolicy::Abort => {
                return Err(error.into());
            }
            Err(error) => {
                warn!("Skipping parcel {}: {}", record.parcel_number, error);
                stats.skipped.push(SkippedParcel {
                    parcel_number: record.parcel_number,
                    reason: error.to_string(),
                });
                continue;
            }
        };

        let depot = classifier.classify(&record.postcode);
        debug!(
            "Parcel {} -> {} (route {}, eta {})",
            record.parcel_number, depot, info.route, info.eta
        );

        buckets.push(depot, record.enrich(info));
        stats.enriched += 1;
    }

    stats.per_depot = buckets
        .iter()
        .map(|(depot, members)| (depot, members.len()))
        .collect();

    info!(
        "Enrichment complete: {} enriched, {} skipped",
        stats.enriched,
        stats.skipped.len()
    );

    Ok(EnrichmentOutcome { buckets, stats })
}
