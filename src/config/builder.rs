//! Fluent builder for [`HecConfig`].

use std::collections::BTreeMap;

use super::{ChannelIdMode, ConfigError, HecConfig};
use crate::level::HecLevel;

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: impl Into<String>) -> Self {
            self.config.$field = Some(value.into());
            self
        }
    };
}

/// Builder that validates on [`build`](Self::build).
#[derive(Clone, Debug, Default)]
pub struct HecConfigBuilder {
    config: HecConfig,
}

impl HecConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector base URL, e.g. `https://splunk:8088/services/collector`.
    pub fn with_collector_url(mut self, url: impl Into<String>) -> Self {
        self.config.collector_url = url.into();
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.config.auth_token = token.into();
        self
    }

    /// Zero selects the fallback timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    /// Zero disables the time trigger; batches then flush on size only.
    pub fn with_batch_interval_ms(mut self, interval_ms: u64) -> Self {
        self.config.batch_interval_ms = interval_ms;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn with_channel_id(mut self, mode: ChannelIdMode) -> Self {
        self.config.channel_id = mode;
        self
    }

    pub fn with_token_as_query_string(mut self, flag: bool) -> Self {
        self.config.use_token_as_query_string = flag;
        self
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.config.custom_headers = headers;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.custom_headers.insert(key.into(), value.into());
        self
    }

    pub fn with_include_scopes(mut self, flag: bool) -> Self {
        self.config.include_scopes = flag;
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_min_level(mut self, level: HecLevel) -> Self {
        self.config.min_level = level;
        self
    }

    option_setter!(
        #[doc = "Override the endpoint path segment."]
        with_endpoint_path,
        endpoint_path
    );
    option_setter!(with_host, host);
    option_setter!(with_index, index);
    option_setter!(with_source, source);
    option_setter!(with_sourcetype, sourcetype);
    option_setter!(
        #[doc = "strftime pattern for record timestamps."]
        with_timestamp_format,
        timestamp_format
    );

    pub fn build(self) -> Result<HecConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
