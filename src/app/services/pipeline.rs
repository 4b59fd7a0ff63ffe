//! Pipeline driver: filter, enrich, partition, group and write
//!
//! A run reads the CSV, keeps rows whose `delivery_date` string equals the
//! requested date, enriches and partitions them, groups each depot by route
//! and finally hands every depot to the [`JsonWriter`]. Manifests are only
//! written once every lookup has finished, so a fatal lookup failure leaves
//! no output behind.

use crate::{Error, Result};
use crate::app::models::{DepotId, ParcelRecord};
use crate::app::services::csv_reader::read_parcel_records;
use crate::app::services::delivery_info::DeliveryInfoSource;
use crate::app::services::depot_classifier::DepotClassifier;
use crate::app::services::enrichment::{
    EnrichmentOptions, EnrichmentStats, enrich_and_partition,
};
use crate::app::services::grouping::{RouteGroups, group_and_sort};
use crate::app::services::json_writer::{JsonWriter, WrittenManifest};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Keep only records whose delivery date equals `date` exactly
pub fn filter_by_date(records: Vec<ParcelRecord>, date: &str) -> Vec<ParcelRecord> {
    records
        .into_iter()
        .filter(|record| record.delivery_date == date)
        .collect()
}

/// Reject matched records that cannot be looked up
pub fn check_parcel_numbers(records: &[ParcelRecord]) -> Result<()> {
    match records
        .iter()
        .position(|record| record.parcel_number.trim().is_empty())
    {
        Some(index) => Err(Error::data_validation(format!(
            "Parcel due on {} has an empty parcel_number (match {} of {})",
            records[index].delivery_date,
            index + 1,
            records.len()
        ))),
        None => Ok(()),
    }
}

/// Per-depot summary of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepotSummary {
    pub depot: DepotId,
    pub routes: usize,
    pub parcels: usize,
}

/// Outcome of a full pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub records_read: usize,
    pub records_matched: usize,
    pub enrichment: EnrichmentStats,
    pub depots: Vec<DepotSummary>,
    pub manifests: Vec<WrittenManifest>,
    pub elapsed: Duration,
}

impl PipelineReport {
    /// Total bytes written across all manifests
    pub fn total_output_size(&self) -> u64 {
        self.manifests.iter().map(|m| m.bytes).sum()
    }
}

/// Parcel sorting pipeline over a delivery info source
#[derive(Debug)]
pub struct Pipeline<S> {
    source: S,
    classifier: DepotClassifier,
    writer: JsonWriter,
    options: EnrichmentOptions,
    show_progress: bool,
}

impl<S: DeliveryInfoSource> Pipeline<S> {
    pub fn new(
        source: S,
        classifier: DepotClassifier,
        writer: JsonWriter,
        options: EnrichmentOptions,
    ) -> Self {
        Self {
            source,
            classifier,
            writer,
            options,
            show_progress: false,
        }
    }

    /// Show a progress bar while lookups run
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Run the pipeline end to end and write depot manifests
    pub async fn run(&self, csv_path: &Path, delivery_date: &str) -> Result<PipelineReport> {
        let start_time = Instant::now();

        let records = read_parcel_records(csv_path)?;
        let records_read = records.len();

        let (depots, enrichment, records_matched) = self.sort(records, delivery_date).await?;

        let manifests = self.writer.write_all(&depots).await?;

        let depots = depots
            .iter()
            .map(|(depot, groups)| DepotSummary {
                depot: *depot,
                routes: groups.len(),
                parcels: groups.parcel_count(),
            })
            .collect();

        Ok(PipelineReport {
            records_read,
            records_matched,
            enrichment,
            depots,
            manifests,
            elapsed: start_time.elapsed(),
        })
    }

    /// Filter, enrich, partition and group records without touching the filesystem
    ///
    /// Returns every depot's route groups in depot order, the enrichment
    /// statistics and the number of records that matched the date.
    pub async fn sort(
        &self,
        records: Vec<ParcelRecord>,
        delivery_date: &str,
    ) -> Result<(Vec<(DepotId, RouteGroups)>, EnrichmentStats, usize)> {
        let total = records.len();
        let matched = filter_by_date(records, delivery_date);
        let records_matched = matched.len();
        check_parcel_numbers(&matched)?;
        info!(
            "{} of {} parcels are due on {}",
            records_matched, total, delivery_date
        );

        let progress = self.create_progress_bar(records_matched as u64);
        let outcome = enrich_and_partition(
            matched,
            &self.source,
            &self.classifier,
            self.options,
            progress.as_ref(),
        )
        .await;
        if let Some(progress) = &progress {
            progress.finish_and_clear();
        }
        let outcome = outcome?;

        let depots = outcome
            .buckets
            .into_iter()
            .map(|(depot, parcels)| {
                let groups = group_and_sort(parcels);
                debug!(
                    "{}: {} parcels on {} routes",
                    depot,
                    groups.parcel_count(),
                    groups.len()
                );
                (depot, groups)
            })
            .collect();

        Ok((depots, outcome.stats, records_matched))
    }

    fn create_progress_bar(&self, len: u64) -> Option<ProgressBar> {
        if !self.show_progress || len == 0 {
            return None;
        }

        let progress = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lookups ({eta})")
        {
            progress.set_style(style.progress_chars("#>-"));
        }
        Some(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::DeliveryInfo;
    use crate::app::services::delivery_info::LookupError;
    use crate::app::services::depot_classifier::DepotRules;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct MapSource(HashMap<&'static str, (&'static str, i64)>);

    impl DeliveryInfoSource for MapSource {
        async fn fetch(
            &self,
            parcel_number: &str,
        ) -> std::result::Result<DeliveryInfo, LookupError> {
            self.0
                .get(parcel_number)
                .map(|(route, eta)| DeliveryInfo::new(*route, *eta))
                .ok_or_else(|| LookupError::from_status(parcel_number, 404, ""))
        }
    }

    fn pipeline(
        responses: &[(&'static str, &'static str, i64)],
        output_dir: &Path,
    ) -> Pipeline<MapSource> {
        let source = MapSource(
            responses
                .iter()
                .map(|(parcel, route, eta)| (*parcel, (*route, *eta)))
                .collect(),
        );
        Pipeline::new(
            source,
            DepotClassifier::from_rules(&DepotRules::default()).unwrap(),
            JsonWriter::new(output_dir),
            EnrichmentOptions::default(),
        )
    }

    fn write_csv(dir: &Path, rows: &[&str]) -> std::path::PathBuf {
        let path = dir.join("parcels.csv");
        let mut contents = String::from("parcel_number,postcode,delivery_date\n");
        for row in rows {
            contents.push_str(row);
            contents.push('\n');
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_filter_by_date_is_exact_string_match() {
        let records = vec![
            ParcelRecord::new("P1", "B1 1AA", "2019-10-20"),
            ParcelRecord::new("P2", "B1 1AA", "2019-10-21"),
            ParcelRecord::new("P3", "B1 1AA", "20/10/2019"),
            ParcelRecord::new("P4", "B1 1AA", "2019-10-20 "),
        ];

        let kept = filter_by_date(records, "2019-10-20");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].parcel_number, "P1");
    }

    #[tokio::test]
    async fn test_run_writes_every_depot() {
        let temp_dir = TempDir::new().unwrap();
        let csv = write_csv(
            temp_dir.path(),
            &[
                "P1,B1 1AA,2019-10-20",
                "P2,LS1 1AA,2019-10-20",
                "P3,S1 1AA,2019-10-21",
            ],
        );
        let output_dir = temp_dir.path().join("output");
        let pipeline = pipeline(&[("P1", "R1", 10), ("P2", "R2", 5)], &output_dir);

        let report = pipeline.run(&csv, "2019-10-20").await.unwrap();

        assert_eq!(report.records_read, 3);
        assert_eq!(report.records_matched, 2);
        assert_eq!(report.manifests.len(), 3);
        assert_eq!(
            report.depots,
            vec![
                DepotSummary {
                    depot: DepotId::Birmingham,
                    routes: 1,
                    parcels: 1
                },
                DepotSummary {
                    depot: DepotId::Leeds,
                    routes: 1,
                    parcels: 1
                },
                DepotSummary {
                    depot: DepotId::Wakefield,
                    routes: 0,
                    parcels: 0
                },
            ]
        );
        assert!(output_dir.join("Wakefield.json").exists());
        assert_eq!(
            report.total_output_size(),
            report.manifests.iter().map(|m| m.bytes).sum::<u64>()
        );
    }

    #[tokio::test]
    async fn test_lookup_failure_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let csv = write_csv(
            temp_dir.path(),
            &["P1,B1 1AA,2019-10-20", "P2,LS1 1AA,2019-10-20"],
        );
        let output_dir = temp_dir.path().join("output");
        let pipeline = pipeline(&[("P1", "R1", 10)], &output_dir);

        let result = pipeline.run(&csv, "2019-10-20").await;

        assert!(matches!(
            result,
            Err(Error::Lookup(LookupError::NotFound { .. }))
        ));
        assert!(!output_dir.exists());
    }

    #[tokio::test]
    async fn test_blank_parcel_number_on_other_date_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let csv = write_csv(
            temp_dir.path(),
            &["P1,B1 1AA,2019-10-20", ",LS1 1AA,2019-10-21"],
        );
        let output_dir = temp_dir.path().join("output");
        let pipeline = pipeline(&[("P1", "R1", 10)], &output_dir);

        let report = pipeline.run(&csv, "2019-10-20").await.unwrap();

        assert_eq!(report.records_read, 2);
        assert_eq!(report.records_matched, 1);
        assert_eq!(report.enrichment.enriched, 1);
    }

    #[tokio::test]
    async fn test_blank_parcel_number_on_matched_date_fails_before_writing() {
        let temp_dir = TempDir::new().unwrap();
        let csv = write_csv(
            temp_dir.path(),
            &["P1,B1 1AA,2019-10-20", ",LS1 1AA,2019-10-20"],
        );
        let output_dir = temp_dir.path().join("output");
        let pipeline = pipeline(&[("P1", "R1", 10)], &output_dir);

        let result = pipeline.run(&csv, "2019-10-20").await;

        assert!(matches!(result, Err(Error::DataValidation { .. })));
        assert!(!output_dir.exists());
    }

    #[tokio::test]
    async fn test_missing_csv_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let pipeline = pipeline(&[], &temp_dir.path().join("output"));

        let result = pipeline
            .run(&temp_dir.path().join("missing.csv"), "2019-10-20")
            .await;

        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }
}
