//! Configuration management and validation.
//!
//! Configuration is layered: built-in defaults, then an optional JSON config
//! file, then environment variables, then command line overrides (applied by
//! the CLI). The lookup token only ever comes from the environment or a
//! config file and is never written back out.

use crate::app::services::depot_classifier::{DepotClassifier, DepotRules};
use crate::app::services::enrichment::FailurePolicy;
use crate::constants::{
    DEFAULT_LOOKUP_BASE_URL, DEFAULT_LOOKUP_CONCURRENCY, DEFAULT_LOOKUP_TIMEOUT_SECS,
    DEFAULT_OUTPUT_DIR, LOOKUP_TOKEN_ENV, LOOKUP_URL_ENV, MAX_LOOKUP_CONCURRENCY,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Remote lookup service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Endpoint the parcel number is appended to
    pub base_url: String,

    /// Bearer credential
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Lookups allowed in flight at once (1 = sequential)
    pub concurrency: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LOOKUP_BASE_URL.to_string(),
            token: None,
            timeout_secs: DEFAULT_LOOKUP_TIMEOUT_SECS,
            concurrency: DEFAULT_LOOKUP_CONCURRENCY,
        }
    }
}

/// Top-level configuration for a sorting run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lookup: LookupConfig,

    /// Directory receiving one manifest per depot
    pub output_dir: PathBuf,

    /// Postcode classification rules
    pub depots: DepotRules,

    /// What to do when a single lookup fails
    pub failure_policy: FailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lookup: LookupConfig::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            depots: DepotRules::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional file and the process environment
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read a JSON config file; missing sections fall back to defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Reading config file: {}", path.display());

        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read config file {}", path.display()), e)
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            Error::configuration(format!("Invalid config file {}: {}", path.display(), e))
        })
    }

    /// Apply environment overrides using the given variable lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(LOOKUP_TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
            debug!("Lookup token taken from {}", LOOKUP_TOKEN_ENV);
            self.lookup.token = Some(token);
        }

        if let Some(url) = lookup(LOOKUP_URL_ENV).filter(|u| !u.trim().is_empty()) {
            debug!("Lookup URL taken from {}: {}", LOOKUP_URL_ENV, url);
            self.lookup.base_url = url;
        }
    }

    /// Check the configuration is usable for a run
    pub fn validate(&self) -> Result<()> {
        if self
            .lookup
            .token
            .as_deref()
            .is_none_or(|token| token.trim().is_empty())
        {
            return Err(Error::configuration(format!(
                "No lookup token configured; set {}",
                LOOKUP_TOKEN_ENV
            )));
        }

        if !(self.lookup.base_url.starts_with("http://")
            || self.lookup.base_url.starts_with("https://"))
        {
            return Err(Error::configuration(format!(
                "Lookup URL must start with http:// or https://: {}",
                self.lookup.base_url
            )));
        }

        if self.lookup.timeout_secs == 0 {
            return Err(Error::configuration(
                "Lookup timeout must be greater than 0 seconds",
            ));
        }

        if self.lookup.concurrency == 0 || self.lookup.concurrency > MAX_LOOKUP_CONCURRENCY {
            return Err(Error::configuration(format!(
                "Lookup concurrency must be between 1 and {}",
                MAX_LOOKUP_CONCURRENCY
            )));
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::configuration("Output directory cannot be empty"));
        }

        // Compiling surfaces bad patterns before any lookups are made
        DepotClassifier::from_rules(&self.depots)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::DepotId;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.lookup.token = Some("secret".to_string());
        config
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.lookup.base_url, DEFAULT_LOOKUP_BASE_URL);
        assert_eq!(config.lookup.concurrency, 1);
        assert_eq!(config.output_dir, PathBuf::from("./output"));
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.depots.default_depot, DepotId::Wakefield);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (LOOKUP_TOKEN_ENV, "from-env"),
            (LOOKUP_URL_ENV, "http://localhost:9000/parcels"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.lookup.token.as_deref(), Some("from-env"));
        assert_eq!(config.lookup.base_url, "http://localhost:9000/parcels");
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = valid_config();
        config.apply_env(|_| Some("   ".to_string()));

        assert_eq!(config.lookup.token.as_deref(), Some("secret"));
        assert_eq!(config.lookup.base_url, DEFAULT_LOOKUP_BASE_URL);
    }

    #[test]
    fn test_validation() {
        assert!(valid_config().validate().is_ok());

        // Missing token
        assert!(Config::default().validate().is_err());

        let mut config = valid_config();
        config.lookup.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.lookup.concurrency = 0;
        assert!(config.validate().is_err());
        config.lookup.concurrency = MAX_LOOKUP_CONCURRENCY + 1;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.lookup.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.depots.rules[0].patterns.push("[".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "lookup": { "timeout_secs": 3 },
                "depots": {
                    "rules": [{ "depot": "Leeds", "patterns": ["^LS"] }],
                    "default_depot": "Birmingham"
                },
                "failure_policy": "skip_record"
            }"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.lookup.timeout_secs, 3);
        assert_eq!(config.lookup.base_url, DEFAULT_LOOKUP_BASE_URL);
        assert_eq!(config.depots.default_depot, DepotId::Birmingham);
        assert_eq!(config.depots.rules.len(), 1);
        assert_eq!(config.failure_policy, FailurePolicy::SkipRecord);
        assert_eq!(config.output_dir, PathBuf::from("./output"));
    }

    #[test]
    fn test_invalid_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(Error::Configuration { .. })
        ));
        assert!(Config::from_file(&temp_dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_token_is_never_serialized() {
        let json = serde_json::to_string(&valid_config()).unwrap();
        assert!(!json.contains("secret"));
    }
}
