//! Data models for parcel sorting
//!
//! This module contains the core data structures for representing parcel
//! delivery records as read from CSV, the delivery information returned by
//! the lookup service, and the fixed set of destination depots.

use crate::constants::{DELIVERY_DATE_COLUMN, PARCEL_NUMBER_COLUMN, POSTCODE_COLUMN};
use crate::{Error, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

// =============================================================================
// Depot Identifiers
// =============================================================================

/// Destination depot a parcel is routed through
///
/// The set is fixed; which postcodes map to which depot is configuration
/// (see [`crate::app::services::depot_classifier::DepotRules`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DepotId {
    Birmingham,
    Leeds,
    Wakefield,
}

impl DepotId {
    /// Every depot, in output order
    pub const ALL: [DepotId; 3] = [DepotId::Birmingham, DepotId::Leeds, DepotId::Wakefield];

    /// Display name used for manifest file names and the top-level JSON key
    pub fn name(&self) -> &'static str {
        match self {
            DepotId::Birmingham => "Birmingham",
            DepotId::Leeds => "Leeds",
            DepotId::Wakefield => "Wakefield",
        }
    }
}

impl fmt::Display for DepotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// ETA
// =============================================================================

/// Estimated delivery time as reported by the lookup service
///
/// The service may answer with a numeric offset or a timestamp string. The
/// JSON value as received is kept so manifests reproduce it exactly. Numbers
/// order numerically, strings lexicographically (ISO-8601 timestamps sort
/// correctly that way) and any number sorts before any string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Eta {
    Number(serde_json::Number),
    Text(String),
}

impl Eta {
    fn numeric_value(number: &serde_json::Number) -> f64 {
        number.as_f64().unwrap_or(f64::NAN)
    }
}

impl Ord for Eta {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Eta::Number(a), Eta::Number(b)) => match (a.as_i64(), b.as_i64()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => Self::numeric_value(a).total_cmp(&Self::numeric_value(b)),
            },
            (Eta::Number(_), Eta::Text(_)) => Ordering::Less,
            (Eta::Text(_), Eta::Number(_)) => Ordering::Greater,
            (Eta::Text(a), Eta::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Eta {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Eta {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Eta {}

impl From<i64> for Eta {
    fn from(value: i64) -> Self {
        Eta::Number(value.into())
    }
}

impl From<&str> for Eta {
    fn from(value: &str) -> Self {
        Eta::Text(value.to_string())
    }
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eta::Number(number) => write!(f, "{}", number),
            Eta::Text(text) => f.write_str(text),
        }
    }
}

// =============================================================================
// Delivery Information
// =============================================================================

/// Route and ETA returned by the lookup service for one parcel
///
/// Additional fields in the response body are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeliveryInfo {
    /// Route code grouping parcels on the same delivery run
    pub route: String,

    /// Estimated time of delivery
    pub eta: Eta,
}

impl DeliveryInfo {
    pub fn new(route: impl Into<String>, eta: impl Into<Eta>) -> Self {
        Self {
            route: route.into(),
            eta: eta.into(),
        }
    }
}

// =============================================================================
// Parcel Records
// =============================================================================

/// One parcel delivery row from the input CSV
///
/// Every source column is preserved in CSV order so the manifests carry the
/// row through unchanged. The three columns the pipeline relies on are also
/// held as typed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParcelRecord {
    /// Identifier sent to the lookup service
    pub parcel_number: String,

    /// Full destination postcode
    pub postcode: String,

    /// Delivery date exactly as written in the CSV
    pub delivery_date: String,

    /// All source columns in CSV order
    columns: Vec<(String, String)>,
}

impl ParcelRecord {
    /// Build a record from CSV columns, requiring the lookup fields to exist
    ///
    /// Values are not checked here; rows for other dates are never looked up.
    pub fn from_columns(columns: Vec<(String, String)>) -> Result<Self> {
        let find = |name: &str| -> Result<String> {
            columns
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| Error::data_validation(format!("Parcel row is missing '{}'", name)))
        };

        Ok(Self {
            parcel_number: find(PARCEL_NUMBER_COLUMN)?,
            postcode: find(POSTCODE_COLUMN)?,
            delivery_date: find(DELIVERY_DATE_COLUMN)?,
            columns,
        })
    }

    /// Convenience constructor holding only the required columns
    pub fn new(
        parcel_number: impl Into<String>,
        postcode: impl Into<String>,
        delivery_date: impl Into<String>,
    ) -> Self {
        let parcel_number = parcel_number.into();
        let postcode = postcode.into();
        let delivery_date = delivery_date.into();
        let columns = vec![
            (POSTCODE_COLUMN.to_string(), postcode.clone()),
            (PARCEL_NUMBER_COLUMN.to_string(), parcel_number.clone()),
            (DELIVERY_DATE_COLUMN.to_string(), delivery_date.clone()),
        ];

        Self {
            parcel_number,
            postcode,
            delivery_date,
            columns,
        }
    }

    /// Source columns in CSV order
    pub fn columns(&self) -> &[(String, String)] {
        &self.columns
    }

    /// Look up a passthrough column by name
    pub fn column(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attach delivery information, consuming the raw record
    ///
    /// Taking `self` by value means a record can only be enriched once.
    pub fn enrich(self, info: DeliveryInfo) -> EnrichedParcel {
        EnrichedParcel {
            record: self,
            route: info.route,
            eta: info.eta,
        }
    }
}

/// A parcel record carrying its route and ETA
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedParcel {
    record: ParcelRecord,
    route: String,
    eta: Eta,
}

impl EnrichedParcel {
    pub fn record(&self) -> &ParcelRecord {
        &self.record
    }

    pub fn parcel_number(&self) -> &str {
        &self.record.parcel_number
    }

    pub fn postcode(&self) -> &str {
        &self.record.postcode
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn eta(&self) -> &Eta {
        &self.eta
    }
}

impl Serialize for EnrichedParcel {
    /// Source columns in CSV order, then `route` and `eta`
    ///
    /// Source columns named `route` or `eta` are replaced by the looked-up values.
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let passthrough = self
            .record
            .columns
            .iter()
            .filter(|(key, _)| key != "route" && key != "eta");

        let mut map = serializer.serialize_map(None)?;
        for (key, value) in passthrough {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("route", &self.route)?;
        map.serialize_entry("eta", &self.eta)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_depot_names_and_order() {
        let names: Vec<&str> = DepotId::ALL.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["Birmingham", "Leeds", "Wakefield"]);
        assert_eq!(DepotId::Leeds.to_string(), "Leeds");
    }

    #[test]
    fn test_eta_numeric_ordering() {
        assert!(Eta::from(3) < Eta::from(5));
        assert!(Eta::from(10) > Eta::from(5));
        assert_eq!(Eta::from(7), Eta::from(7));

        let fractional: Eta = serde_json::from_str("2.5").unwrap();
        assert!(fractional > Eta::from(2));
        assert!(fractional < Eta::from(3));
    }

    #[test]
    fn test_eta_timestamp_ordering() {
        let early = Eta::from("2019-10-20T09:15:00Z");
        let late = Eta::from("2019-10-20T14:00:00Z");
        assert!(early < late);
        // Numbers always sort ahead of text
        assert!(Eta::from(999) < early);
    }

    #[test]
    fn test_eta_preserves_received_json() {
        let eta: Eta = serde_json::from_str("10").unwrap();
        assert_eq!(serde_json::to_string(&eta).unwrap(), "10");

        let eta: Eta = serde_json::from_str("\"2019-10-20T09:15:00Z\"").unwrap();
        assert_eq!(
            serde_json::to_string(&eta).unwrap(),
            "\"2019-10-20T09:15:00Z\""
        );
    }

    #[test]
    fn test_delivery_info_ignores_extra_fields() {
        let info: DeliveryInfo =
            serde_json::from_str(r#"{"route":"R1","eta":10,"driver":"Sam"}"#).unwrap();
        assert_eq!(info, DeliveryInfo::new("R1", 10));

        let missing_route: std::result::Result<DeliveryInfo, _> =
            serde_json::from_str(r#"{"eta":10}"#);
        assert!(missing_route.is_err());
    }

    #[test]
    fn test_record_from_columns() {
        let record = ParcelRecord::from_columns(columns(&[
            ("postcode", "B1 1AA"),
            ("parcel_number", "P1"),
            ("delivery_date", "2019-10-20"),
            ("weight", "2.4"),
        ]))
        .unwrap();

        assert_eq!(record.parcel_number, "P1");
        assert_eq!(record.postcode, "B1 1AA");
        assert_eq!(record.delivery_date, "2019-10-20");
        assert_eq!(record.column("weight"), Some("2.4"));
        assert_eq!(record.columns().len(), 4);
    }

    #[test]
    fn test_record_from_columns_requires_lookup_fields() {
        let result = ParcelRecord::from_columns(columns(&[
            ("postcode", "B1 1AA"),
            ("delivery_date", "2019-10-20"),
        ]));
        assert!(result.is_err());

        // Blank values are accepted at read time
        let record = ParcelRecord::from_columns(columns(&[
            ("postcode", "B1 1AA"),
            ("parcel_number", ""),
            ("delivery_date", "2019-10-21"),
        ]))
        .unwrap();
        assert_eq!(record.parcel_number, "");
    }

    #[test]
    fn test_enriched_parcel_serializes_columns_then_enrichment() {
        let record = ParcelRecord::from_columns(columns(&[
            ("parcel_number", "P1"),
            ("postcode", "LS1 1AA"),
            ("delivery_date", "2019-10-20"),
            ("route", "stale"),
            ("recipient", "A. Person"),
        ]))
        .unwrap();

        let parcel = record.enrich(DeliveryInfo::new("R2", 5));
        let json = serde_json::to_string(&parcel).unwrap();

        assert_eq!(
            json,
            r#"{"parcel_number":"P1","postcode":"LS1 1AA","delivery_date":"2019-10-20","recipient":"A. Person","route":"R2","eta":5}"#
        );
        assert_eq!(parcel.route(), "R2");
        assert_eq!(parcel.eta(), &Eta::from(5));
    }
}
