//! CSV ingestion for parcel delivery records
//!
//! Reads a headed CSV file into [`ParcelRecord`]s, keeping every column in
//! file order. The `postcode`, `parcel_number` and `delivery_date` columns
//! must be present.

use crate::app::models::ParcelRecord;
use crate::constants::REQUIRED_COLUMNS;
use crate::{Error, Result};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Read every parcel record from a CSV file
pub fn read_parcel_records(path: &Path) -> Result<Vec<ParcelRecord>> {
    let file_name = path.to_string_lossy().to_string();

    if !path.exists() {
        return Err(Error::file_not_found(file_name));
    }

    let file = std::fs::File::open(path)
        .map_err(|e| Error::io(format!("Failed to open CSV file: {}", path.display()), e))?;

    let records = read_parcel_records_from(file, &file_name)?;
    info!("Read {} parcel records from {}", records.len(), file_name);
    Ok(records)
}

/// Read parcel records from any reader; `source_name` is used in diagnostics
pub fn read_parcel_records_from<R: Read>(reader: R, source_name: &str) -> Result<Vec<ParcelRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| {
            Error::csv_parsing(source_name, "Failed to read CSV header row", Some(e))
        })?
        .clone();

    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *required) {
            return Err(Error::csv_parsing(
                source_name,
                format!("Missing required column '{}'", required),
                None,
            ));
        }
    }
    debug!("CSV columns: {:?}", headers);

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        // Line 1 is the header
        let line = index + 2;
        let row = row.map_err(|e| {
            Error::csv_parsing(source_name, format!("Failed to read row {}", line), Some(e))
        })?;

        let columns = headers
            .iter()
            .zip(row.iter())
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        let record = ParcelRecord::from_columns(columns).map_err(|e| {
            Error::csv_parsing(source_name, format!("Row {}: {}", line, e), None)
        })?;
        records.push(record);
    }

    Ok(records)
}
