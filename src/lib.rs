//! Parcel Sorter Library
//!
//! A Rust library for turning a day's parcel delivery records into per-depot
//! route manifests.
//!
//! This library provides tools for:
//! - Reading parcel records from CSV while preserving every source column
//! - Looking up route codes and ETAs from the remote parcel lookup service
//! - Classifying parcels into depots by postcode outward code
//! - Grouping each depot's parcels by route in ascending ETA order
//! - Writing one pretty-printed JSON manifest per depot

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod csv_reader;
        pub mod delivery_info;
        pub mod depot_classifier;
        pub mod enrichment;
        pub mod grouping;
        pub mod json_writer;
        pub mod pipeline;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{DepotId, EnrichedParcel, Eta, ParcelRecord};
pub use app::services::delivery_info::LookupError;
pub use config::Config;

/// Result type alias for the parcel sorter
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for every stage of a sorting run
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Command line arguments were rejected
    #[error("Invalid arguments: {message}")]
    Argument { message: String },

    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// CSV parsing error
    #[error("CSV parsing error in file '{file}': {message}")]
    CsvParsing {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// Data validation error
    #[error("Data validation error: {message}")]
    DataValidation { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Remote lookup failed for a parcel
    #[error("Delivery lookup failed: {0}")]
    Lookup(#[from] LookupError),

    /// Writing a depot manifest failed
    #[error("Output error writing '{path}': {message}")]
    Output {
        path: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create an argument error
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument {
            message: message.into(),
        }
    }

    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a CSV parsing error with context
    pub fn csv_parsing(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::CsvParsing {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a data validation error
    pub fn data_validation(message: impl Into<String>) -> Self {
        Self::DataValidation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an output error for a specific file
    pub fn output(
        path: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Output {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            message: message.into(),
            source,
        }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }

    /// Message followed by every underlying cause, for user-facing diagnostics
    ///
    /// Causes whose text already appears in the message are not repeated.
    pub fn display_chain(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        message
    }

    /// Name of the pipeline stage that produced this error, for diagnostics
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Argument { .. } => "arguments",
            Self::Configuration { .. } => "configuration",
            Self::Io { .. } | Self::FileNotFound { .. } | Self::CsvParsing { .. } => "csv input",
            Self::DataValidation { .. } => "validation",
            Self::Lookup(_) => "delivery lookup",
            Self::Output { .. } | Self::Serialization { .. } => "output",
            Self::ProcessingInterrupted { .. } => "interrupted",
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::CsvParsing {
            file: "unknown".to_string(),
            message: "CSV parsing failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON serialization failed".to_string(),
            source: error,
        }
    }
}
