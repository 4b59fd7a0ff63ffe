//! Depot manifest writer
//!
//! Each depot is written to `<output_dir>/<Depot>.json` as
//! `{ "<Depot>": { "<route>": [parcels...] } }`, pretty-printed with
//! four-space indentation. All manifests are serialized before anything is
//! written, and the first failed write stops the remaining ones.

use crate::app::models::DepotId;
use crate::app::services::grouping::RouteGroups;
use crate::constants::{MANIFEST_EXTENSION, MANIFEST_INDENT};
use crate::{Error, Result};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One depot's manifest document
#[derive(Debug, Clone, Copy)]
pub struct DepotManifest<'a> {
    pub depot: DepotId,
    pub groups: &'a RouteGroups,
}

impl Serialize for DepotManifest<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.depot.name(), self.groups)?;
        map.end()
    }
}

/// A manifest that was written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenManifest {
    pub depot: DepotId,
    pub path: PathBuf,
    pub bytes: u64,
}

/// Render a manifest exactly as it is written to disk
pub fn render_manifest(depot: DepotId, groups: &RouteGroups) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(MANIFEST_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);

    DepotManifest { depot, groups }
        .serialize(&mut serializer)
        .map_err(|e| Error::serialization(format!("Failed to serialize {} manifest", depot), e))?;

    Ok(buffer)
}

/// Writes depot manifests into an output directory
#[derive(Debug, Clone)]
pub struct JsonWriter {
    output_dir: PathBuf,
}

impl JsonWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of a depot's manifest
    pub fn manifest_path(&self, depot: DepotId) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", depot.name(), MANIFEST_EXTENSION))
    }

    /// Serialize and write every depot's manifest
    pub async fn write_all(&self, depots: &[(DepotId, RouteGroups)]) -> Result<Vec<WrittenManifest>> {
        let rendered = depots
            .iter()
            .map(|(depot, groups)| Ok((*depot, render_manifest(*depot, groups)?)))
            .collect::<Result<Vec<_>>>()?;

        if !self.output_dir.exists() {
            debug!("Creating output directory {}", self.output_dir.display());
        }
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| {
                Error::output(
                    self.output_dir.to_string_lossy(),
                    "Failed to create output directory",
                    e,
                )
            })?;

        let mut written = Vec::with_capacity(rendered.len());
        for (depot, contents) in rendered {
            let path = self.manifest_path(depot);
            tokio::fs::write(&path, &contents).await.map_err(|e| {
                Error::output(path.to_string_lossy(), "Failed to write depot manifest", e)
            })?;

            info!("Wrote {} ({} bytes)", path.display(), contents.len());
            written.push(WrittenManifest {
                depot,
                path,
                bytes: contents.len() as u64,
            });
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{DeliveryInfo, ParcelRecord};
    use crate::app::services::grouping::group_and_sort;
    use tempfile::TempDir;

    fn groups() -> RouteGroups {
        group_and_sort(vec![
            ParcelRecord::new("P1", "B1 1AA", "2019-10-20").enrich(DeliveryInfo::new("R1", 10)),
        ])
    }

    #[test]
    fn test_render_manifest_layout() {
        let rendered = String::from_utf8(render_manifest(DepotId::Birmingham, &groups()).unwrap())
            .unwrap();

        let expected = r#"{
    "Birmingham": {
        "R1": [
            {
                "postcode": "B1 1AA",
                "parcel_number": "P1",
                "delivery_date": "2019-10-20",
                "route": "R1",
                "eta": 10
            }
        ]
    }
}"#;
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_empty_manifest() {
        let rendered =
            String::from_utf8(render_manifest(DepotId::Leeds, &RouteGroups::default()).unwrap())
                .unwrap();
        assert_eq!(rendered, "{\n    \"Leeds\": {}\n}");
    }

    #[tokio::test]
    async fn test_write_all_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let output_dir = temp_dir.path().join("nested").join("output");
        let writer = JsonWriter::new(&output_dir);

        let written = writer
            .write_all(&[
                (DepotId::Birmingham, groups()),
                (DepotId::Leeds, RouteGroups::default()),
            ])
            .await
            .unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(written[0].path, output_dir.join("Birmingham.json"));
        assert!(output_dir.join("Leeds.json").exists());

        let contents = std::fs::read_to_string(output_dir.join("Birmingham.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["Birmingham"]["R1"][0]["parcel_number"], "P1");
        assert_eq!(written[0].bytes, contents.len() as u64);
    }

    #[tokio::test]
    async fn test_write_failure_names_file() {
        let temp_dir = TempDir::new().unwrap();
        // A file where the output directory should be
        let blocker = temp_dir.path().join("output");
        std::fs::write(&blocker, "not a directory").unwrap();

        let writer = JsonWriter::new(&blocker);
        let error = writer
            .write_all(&[(DepotId::Wakefield, RouteGroups::default())])
            .await
            .unwrap_err();

        assert!(matches!(error, Error::Output { .. }));
    }
}
