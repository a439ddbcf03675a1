//! Payload transformers turning event records into serialized units.
//!
//! A transformer runs on the caller's thread, once per record, and its output
//! string is what the batch queue carries. Two implementations exist, one
//! per collector endpoint:
//!
//! - [`RawPayloadTransformer`] renders a human-readable text block.
//! - [`JsonPayloadTransformer`] renders one `/event` JSON document.
//!
//! Both accept an optional [`PayloadCreator`] that replaces the default
//! payload with caller-defined JSON.

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::config::HecConfig;
use crate::hec::Endpoint;
use crate::log_record::HecLogRecord;

mod json;
mod raw;

pub use json::{HecEvent, JsonPayloadTransformer};
pub use raw::RawPayloadTransformer;

/// Caller-supplied payload hook. Must be cheap and must not block.
pub type PayloadCreator = Arc<dyn Fn(&HecLogRecord) -> serde_json::Value + Send + Sync>;

/// Failure while serializing a record.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to serialise event: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait for turning records into queueable strings.
pub trait PayloadTransformer: Send + Sync {
    /// Endpoint whose wire format this transformer produces.
    fn endpoint(&self) -> Endpoint;

    fn transform(&self, record: &HecLogRecord, config: &HecConfig)
    -> Result<String, TransformError>;
}

/// Shared transformer trait object used by loggers.
#[derive(Clone)]
pub struct SharedTransformer {
    inner: Arc<dyn PayloadTransformer>,
}

impl SharedTransformer {
    pub fn new<T>(transformer: T) -> Self
    where
        T: PayloadTransformer + 'static,
    {
        Self {
            inner: Arc::new(transformer),
        }
    }

    pub fn from_arc(inner: Arc<dyn PayloadTransformer>) -> Self {
        Self { inner }
    }

    pub fn endpoint(&self) -> Endpoint {
        self.inner.endpoint()
    }

    pub fn transform(
        &self,
        record: &HecLogRecord,
        config: &HecConfig,
    ) -> Result<String, TransformError> {
        self.inner.transform(record, config)
    }
}

impl fmt::Debug for SharedTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedTransformer({:?})", self.inner.endpoint())
    }
}

impl From<RawPayloadTransformer> for SharedTransformer {
    fn from(value: RawPayloadTransformer) -> Self {
        Self::new(value)
    }
}

impl From<JsonPayloadTransformer> for SharedTransformer {
    fn from(value: JsonPayloadTransformer) -> Self {
        Self::new(value)
    }
}
