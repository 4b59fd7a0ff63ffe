//! Application constants for the parcel sorter
//!
//! This module contains default values, environment variable names and the
//! default depot classification patterns used throughout the application.

// =============================================================================
// Input Columns
// =============================================================================

/// CSV column holding the parcel identifier used for lookups
pub const PARCEL_NUMBER_COLUMN: &str = "parcel_number";

/// CSV column holding the destination postcode
pub const POSTCODE_COLUMN: &str = "postcode";

/// CSV column holding the delivery date, compared verbatim against the filter date
pub const DELIVERY_DATE_COLUMN: &str = "delivery_date";

/// Columns every input CSV must provide
pub const REQUIRED_COLUMNS: &[&str] = &[POSTCODE_COLUMN, PARCEL_NUMBER_COLUMN, DELIVERY_DATE_COLUMN];

/// Accepted shape of the date argument
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Remote Lookup Service
// =============================================================================

/// Default parcel lookup endpoint; the parcel number is appended as a path segment
pub const DEFAULT_LOOKUP_BASE_URL: &str =
    "https://us-central1-dpduk-s-test-d1.cloudfunctions.net/parcels";

/// Environment variable supplying the bearer credential
pub const LOOKUP_TOKEN_ENV: &str = "PARCEL_LOOKUP_TOKEN";

/// Environment variable overriding the lookup endpoint
pub const LOOKUP_URL_ENV: &str = "PARCEL_LOOKUP_URL";

/// Default per-request timeout in seconds
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 10;

/// Default number of lookups in flight (1 = strictly sequential)
pub const DEFAULT_LOOKUP_CONCURRENCY: usize = 1;

/// Upper bound accepted for lookup concurrency
pub const MAX_LOOKUP_CONCURRENCY: usize = 64;

/// User agent sent with every lookup
pub const USER_AGENT: &str = concat!("parcel-sorter/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Output
// =============================================================================

/// Default directory for depot manifests
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

/// Extension of each depot manifest
pub const MANIFEST_EXTENSION: &str = "json";

/// Indentation used when pretty-printing manifests
pub const MANIFEST_INDENT: &[u8] = b"    ";

// =============================================================================
// Depot Classification
// =============================================================================

/// Default outward code patterns per depot, tested in this order
pub mod depot_patterns {
    /// Birmingham: B<digit>, Telford, Dudley, Wolverhampton
    pub const BIRMINGHAM: &[&str] = &[r"B\d", "TF", "DY", "WV"];

    /// Leeds: Heckmondwike, Bradford, Leeds
    pub const LEEDS: &[&str] = &["WF16", "BD", "LS"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_columns_cover_lookup_fields() {
        assert!(REQUIRED_COLUMNS.contains(&PARCEL_NUMBER_COLUMN));
        assert!(REQUIRED_COLUMNS.contains(&POSTCODE_COLUMN));
        assert!(REQUIRED_COLUMNS.contains(&DELIVERY_DATE_COLUMN));
    }

    #[test]
    fn test_default_patterns_are_valid_regex() {
        for pattern in depot_patterns::BIRMINGHAM
            .iter()
            .chain(depot_patterns::LEEDS.iter())
        {
            assert!(regex::Regex::new(pattern).is_ok(), "bad pattern {pattern}");
        }
    }
}
