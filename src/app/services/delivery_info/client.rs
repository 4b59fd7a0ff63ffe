//! HTTP client for the parcel lookup service

use super::{DeliveryInfo, DeliveryInfoSource, LookupError};
use crate::config::LookupConfig;
use crate::constants::USER_AGENT;
use crate::{Error, Result};
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, warn};

/// Looks up parcels with `GET <base-url>/<parcel_number>` and a bearer token
#[derive(Debug, Clone)]
pub struct HttpDeliveryInfoClient {
    client: reqwest::Client,
    base_url: Url,
    token: String,
}

impl HttpDeliveryInfoClient {
    /// Create a client from lookup configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the token is missing, the base URL is
    /// not an http(s) URL, or the HTTP client cannot be built.
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| Error::configuration("No lookup token configured"))?;

        let base_url = Url::parse(&config.base_url).map_err(|e| {
            Error::configuration(format!("Invalid lookup URL '{}': {}", config.base_url, e))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(Error::configuration(format!(
                "Lookup URL must be an http(s) URL: {}",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::configuration(format!("Lookup HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// URL for a parcel, with the parcel number as an escaped path segment
    pub fn parcel_url(&self, parcel_number: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(parcel_number);
        }
        url
    }

    fn transport_error(parcel_number: &str, error: reqwest::Error) -> LookupError {
        let parcel_number = parcel_number.to_string();
        let status = error.status().map(|s| s.as_u16());

        if error.is_timeout() {
            LookupError::Service {
                parcel_number,
                status,
                cause: "request timed out".to_string(),
            }
        } else if error.is_connect() || error.is_request() {
            LookupError::Service {
                parcel_number,
                status,
                cause: error.to_string(),
            }
        } else {
            LookupError::Unknown {
                parcel_number,
                status,
                cause: error.to_string(),
            }
        }
    }
}

impl DeliveryInfoSource for HttpDeliveryInfoClient {
    async fn fetch(&self, parcel_number: &str) -> std::result::Result<DeliveryInfo, LookupError> {
        let url = self.parcel_url(parcel_number);
        debug!(parcel = %parcel_number, "Looking up delivery info");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Self::transport_error(parcel_number, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = LookupError::from_status(parcel_number, status.as_u16(), body.trim());
            warn!(parcel = %parcel_number, status = status.as_u16(), "Lookup failed");
            return Err(error);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::transport_error(parcel_number, e))?;

        serde_json::from_slice::<DeliveryInfo>(&bytes).map_err(|e| LookupError::Unknown {
            parcel_number: parcel_number.to_string(),
            status: Some(status.as_u16()),
            cause: format!("invalid response body: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str, token: Option<&str>) -> LookupConfig {
        LookupConfig {
            base_url: base_url.to_string(),
            token: token.map(str::to_string),
            ..LookupConfig::default()
        }
    }

    #[test]
    fn test_parcel_url_appends_segment() {
        let client =
            HttpDeliveryInfoClient::new(&config("https://lookup.test/parcels", Some("t"))).unwrap();
        assert_eq!(
            client.parcel_url("P123").as_str(),
            "https://lookup.test/parcels/P123"
        );

        let client =
            HttpDeliveryInfoClient::new(&config("https://lookup.test/parcels/", Some("t")))
                .unwrap();
        assert_eq!(
            client.parcel_url("P123").as_str(),
            "https://lookup.test/parcels/P123"
        );
    }

    #[test]
    fn test_parcel_url_escapes_parcel_number() {
        let client =
            HttpDeliveryInfoClient::new(&config("https://lookup.test/parcels", Some("t"))).unwrap();
        assert_eq!(
            client.parcel_url("A/B 1").as_str(),
            "https://lookup.test/parcels/A%2FB%201"
        );
    }

    #[test]
    fn test_missing_token_is_rejected() {
        assert!(HttpDeliveryInfoClient::new(&config("https://lookup.test", None)).is_err());
        assert!(HttpDeliveryInfoClient::new(&config("https://lookup.test", Some("  "))).is_err());
    }

    #[test]
    fn test_non_http_url_is_rejected() {
        assert!(HttpDeliveryInfoClient::new(&config("ftp://lookup.test", Some("t"))).is_err());
        assert!(HttpDeliveryInfoClient::new(&config("not a url", Some("t"))).is_err());
    }
}
