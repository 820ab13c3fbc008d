//! Palette timing and search policy configuration.

use std::{collections::BTreeMap, time::Duration};

use palette_contract::SearchDomain;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAX_DEBOUNCE_MS: u64 = 2_000;
const MAX_CLOSE_DELAY_MS: u64 = 1_000;

/// Per-domain search limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPolicy {
    /// Trimmed queries shorter than this are not dispatched.
    pub min_query_len: usize,
    /// Results kept per response.
    pub max_results: usize,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            min_query_len: 1,
            max_results: 10,
        }
    }
}

/// Palette configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Input quiescence before a search is dispatched.
    pub debounce_ms: u64,
    /// Time the success state stays visible before the palette closes.
    pub close_delay_ms: u64,
    /// Policies keyed by domain; unlisted domains use [`SearchPolicy::default`].
    pub search_domains: BTreeMap<String, SearchPolicy>,
    /// Error notification text for failures without a message.
    pub error_fallback: String,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        let mut search_domains = BTreeMap::new();
        search_domains.insert(
            SearchDomain::USER.to_string(),
            SearchPolicy {
                min_query_len: 2,
                max_results: 8,
            },
        );
        search_domains.insert(
            SearchDomain::FEATURE_FLAG.to_string(),
            SearchPolicy {
                min_query_len: 1,
                max_results: 10,
            },
        );
        Self {
            debounce_ms: 300,
            close_delay_ms: 150,
            search_domains,
            error_fallback: "Something went wrong".to_string(),
        }
    }
}

/// Configuration parsing and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("invalid palette config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is out of range.
    #[error("palette config field `{field}` is out of range: {detail}")]
    OutOfRange {
        /// Offending field.
        field: String,
        /// Accepted range.
        detail: String,
    },
}

impl PaletteConfig {
    /// Parses and validates a JSON document; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and [`ConfigError::OutOfRange`] when
    /// validation fails.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::OutOfRange {
                field: "debounce_ms".to_string(),
                detail: format!("expected at most {MAX_DEBOUNCE_MS}"),
            });
        }
        if self.close_delay_ms > MAX_CLOSE_DELAY_MS {
            return Err(ConfigError::OutOfRange {
                field: "close_delay_ms".to_string(),
                detail: format!("expected at most {MAX_CLOSE_DELAY_MS}"),
            });
        }
        for (domain, policy) in &self.search_domains {
            if policy.max_results == 0 {
                return Err(ConfigError::OutOfRange {
                    field: format!("search_domains.{domain}.max_results"),
                    detail: "expected at least 1".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Debounce as a [`Duration`].
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Close delay as a [`Duration`].
    pub fn close_delay(&self) -> Duration {
        Duration::from_millis(self.close_delay_ms)
    }

    /// Policy for `domain`.
    pub fn policy(&self, domain: &SearchDomain) -> SearchPolicy {
        self.search_domains
            .get(domain.as_str())
            .copied()
            .unwrap_or_default()
    }
}
