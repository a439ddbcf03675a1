//! Configuration snapshot for the collector pipeline.
//!
//! A [`HecConfig`] is immutable once published: reloads replace the whole
//! snapshot (see [`ConfigMonitor`]) rather than editing fields in place.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::level::HecLevel;
use crate::processor::BatchSettings;
use crate::timestamp;

mod builder;
mod monitor;

pub use builder::HecConfigBuilder;
pub use monitor::{ConfigListener, ConfigMonitor, SubscriptionId};

pub const DEFAULT_TIMEOUT_MS: u64 = 1_500;
pub const DEFAULT_BATCH_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_BATCH_SIZE: usize = 50;
/// Request timeout used when `timeout_ms` is zero.
pub const FALLBACK_TIMEOUT: Duration = Duration::from_secs(100);

/// Errors raised while validating or loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("collector_url is required")]
    MissingCollectorUrl,
    #[error("auth_token is required")]
    MissingAuthToken,
    #[error("collector_url must start with http:// or https://, got {0:?}")]
    InvalidUrl(String),
    #[error("invalid configuration: {0}")]
    InvalidValue(String),
    #[error("unsupported timestamp_format: {0:?}")]
    InvalidTimestampFormat(String),
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(ConfigError::InvalidValue(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

/// Where the client puts its per-session channel identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelIdMode {
    #[default]
    None,
    QueryString,
    Header,
}

/// One immutable view of the pipeline configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HecConfig {
    pub collector_url: String,
    pub auth_token: String,
    pub timeout_ms: u64,
    pub batch_interval_ms: u64,
    pub batch_size: usize,
    pub channel_id: ChannelIdMode,
    pub use_token_as_query_string: bool,
    pub custom_headers: BTreeMap<String, String>,
    /// Overrides the path segment chosen by the endpoint variant.
    pub endpoint_path: Option<String>,
    pub include_scopes: bool,
    pub host: Option<String>,
    pub index: Option<String>,
    pub source: Option<String>,
    pub sourcetype: Option<String>,
    pub fields: BTreeMap<String, String>,
    pub timestamp_format: Option<String>,
    pub min_level: HecLevel,
}

impl Default for HecConfig {
    fn default() -> Self {
        Self {
            collector_url: String::new(),
            auth_token: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            batch_interval_ms: DEFAULT_BATCH_INTERVAL_MS,
            batch_size: DEFAULT_BATCH_SIZE,
            channel_id: ChannelIdMode::None,
            use_token_as_query_string: false,
            custom_headers: BTreeMap::new(),
            endpoint_path: None,
            include_scopes: false,
            host: None,
            index: None,
            source: None,
            sourcetype: None,
            fields: BTreeMap::new(),
            timestamp_format: None,
            min_level: HecLevel::Trace,
        }
    }
}

impl HecConfig {
    pub fn builder() -> HecConfigBuilder {
        HecConfigBuilder::new()
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: HecConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.collector_url.trim();
        if url.is_empty() {
            return Err(ConfigError::MissingCollectorUrl);
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.collector_url.clone()));
        }
        if self.auth_token.trim().is_empty() {
            return Err(ConfigError::MissingAuthToken);
        }
        ensure_positive!(self.batch_size, "batch_size")?;
        if let Some(pattern) = &self.timestamp_format {
            if !timestamp::is_valid_format(pattern) {
                return Err(ConfigError::InvalidTimestampFormat(pattern.clone()));
            }
        }
        Ok(())
    }

    /// Effective per-request timeout.
    pub fn timeout(&self) -> Duration {
        if self.timeout_ms > 0 {
            Duration::from_millis(self.timeout_ms)
        } else {
            FALLBACK_TIMEOUT
        }
    }

    pub fn batch_settings(&self) -> BatchSettings {
        BatchSettings {
            batch_size: self.batch_size.max(1),
            interval: (self.batch_interval_ms > 0)
                .then(|| Duration::from_millis(self.batch_interval_ms)),
        }
    }

    pub fn timestamp_format(&self) -> Option<&str> {
        self.timestamp_format.as_deref()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
