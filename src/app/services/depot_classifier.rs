//! Depot classification by postcode outward code
//!
//! Parcels are assigned to a depot by testing the outward code of their
//! postcode against an ordered list of per-depot regex patterns. The first
//! depot with a matching pattern wins and anything unmatched falls through to
//! the default depot, so classification is total and deterministic.

use crate::app::models::DepotId;
use crate::constants::depot_patterns;
use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Patterns routing outward codes to one depot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepotRule {
    pub depot: DepotId,
    pub patterns: Vec<String>,
}

/// Classification rules as configuration data
///
/// Rules are evaluated in order; `default_depot` receives everything that no
/// rule matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepotRules {
    pub rules: Vec<DepotRule>,
    pub default_depot: DepotId,
}

impl Default for DepotRules {
    fn default() -> Self {
        let to_strings = |patterns: &[&str]| patterns.iter().map(|p| p.to_string()).collect();

        Self {
            rules: vec![
                DepotRule {
                    depot: DepotId::Birmingham,
                    patterns: to_strings(depot_patterns::BIRMINGHAM),
                },
                DepotRule {
                    depot: DepotId::Leeds,
                    patterns: to_strings(depot_patterns::LEEDS),
                },
            ],
            default_depot: DepotId::Wakefield,
        }
    }
}

/// Extract the outward code: everything before the first space
///
/// A postcode without a space is its own outward code.
pub fn outward_code(postcode: &str) -> &str {
    let trimmed = postcode.trim_start();
    trimmed.split(' ').next().unwrap_or(trimmed)
}

/// Compiled depot classifier
#[derive(Debug, Clone)]
pub struct DepotClassifier {
    rules: Vec<(DepotId, Vec<Regex>)>,
    default_depot: DepotId,
}

impl DepotClassifier {
    /// Compile classification rules, rejecting invalid patterns
    pub fn from_rules(rules: &DepotRules) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.rules.len());

        for rule in &rules.rules {
            let patterns = rule
                .patterns
                .iter()
                .map(|pattern| {
                    Regex::new(pattern).map_err(|e| {
                        Error::configuration(format!(
                            "Invalid postcode pattern '{}' for depot {}: {}",
                            pattern, rule.depot, e
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            compiled.push((rule.depot, patterns));
        }

        debug!(
            "Compiled {} depot rules, default depot {}",
            compiled.len(),
            rules.default_depot
        );

        Ok(Self {
            rules: compiled,
            default_depot: rules.default_depot,
        })
    }

    /// Depot receiving unmatched postcodes
    pub fn default_depot(&self) -> DepotId {
        self.default_depot
    }

    /// Classify a full postcode into its depot
    pub fn classify(&self, postcode: &str) -> DepotId {
        self.classify_outward_code(outward_code(postcode))
    }

    /// Classify an already extracted outward code
    pub fn classify_outward_code(&self, outward_code: &str) -> DepotId {
        self.rules
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| p.is_match(outward_code)))
            .map(|(depot, _)| *depot)
            .unwrap_or(self.default_depot)
    }
}
