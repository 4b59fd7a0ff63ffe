//! Delivery information lookups
//!
//! Each parcel's route code and ETA come from a remote lookup service. This
//! module defines the [`DeliveryInfoSource`] seam the enrichment stage calls
//! through, the failure taxonomy for lookups, and the HTTP implementation.
//!
//! # Failure classification
//!
//! | Response                                  | Error                       |
//! |-------------------------------------------|-----------------------------|
//! | 401, 403                                  | [`LookupError::Auth`]       |
//! | 404                                       | [`LookupError::NotFound`]   |
//! | 5xx, timeout, connection failure          | [`LookupError::Service`]    |
//! | other status, undecodable response body   | [`LookupError::Unknown`]    |

pub mod client;

pub use client::HttpDeliveryInfoClient;

pub use crate::app::models::DeliveryInfo;

/// Source of route and ETA data for parcels
pub trait DeliveryInfoSource: Send + Sync {
    /// Look up delivery information for one parcel
    fn fetch(
        &self,
        parcel_number: &str,
    ) -> impl std::future::Future<Output = Result<DeliveryInfo, LookupError>> + Send;
}

/// Why a lookup for a parcel failed
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Credential rejected by the service
    #[error(
        "authorization rejected (HTTP {status}) looking up parcel {parcel_number}; check the lookup token"
    )]
    Auth { parcel_number: String, status: u16 },

    /// Service has no record of the parcel
    #[error("parcel {parcel_number} not found by the lookup service (HTTP 404)")]
    NotFound { parcel_number: String },

    /// Service failed or was unreachable
    #[error(
        "lookup service unavailable for parcel {parcel_number} ({}): {cause}; try again later",
        status_label(.status)
    )]
    Service {
        parcel_number: String,
        status: Option<u16>,
        cause: String,
    },

    /// Anything else
    #[error(
        "unexpected lookup failure for parcel {parcel_number} ({}): {cause}",
        status_label(.status)
    )]
    Unknown {
        parcel_number: String,
        status: Option<u16>,
        cause: String,
    },
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {}", code),
        None => "no response".to_string(),
    }
}

impl LookupError {
    /// Classify a non-success HTTP status
    pub fn from_status(parcel_number: &str, status: u16, cause: impl Into<String>) -> Self {
        let parcel_number = parcel_number.to_string();
        match status {
            401 | 403 => Self::Auth {
                parcel_number,
                status,
            },
            404 => Self::NotFound { parcel_number },
            500..=599 => Self::Service {
                parcel_number,
                status: Some(status),
                cause: cause.into(),
            },
            _ => Self::Unknown {
                parcel_number,
                status: Some(status),
                cause: cause.into(),
            },
        }
    }

    /// Parcel the failed lookup was for
    pub fn parcel_number(&self) -> &str {
        match self {
            Self::Auth { parcel_number, .. }
            | Self::NotFound { parcel_number }
            | Self::Service { parcel_number, .. }
            | Self::Unknown { parcel_number, .. } => parcel_number,
        }
    }

    /// HTTP status, when the service answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::Service { status, .. } | Self::Unknown { status, .. } => *status,
        }
    }

    /// Authorization failures can never succeed for later parcels either
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}
