//! Event documents for the `/event` endpoint.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::{PayloadCreator, PayloadTransformer, TransformError};
use crate::config::HecConfig;
use crate::hec::Endpoint;
use crate::log_record::HecLogRecord;
use crate::timestamp::epoch_seconds;

/// One collector event. Unset metadata is omitted from the wire form.
#[derive(Debug, Serialize)]
pub struct HecEvent<'a, E: Serialize> {
    /// Always epoch seconds; the endpoint rejects other formats.
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sourcetype: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<E>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<&'a str, &'a str>,
}

impl<'a, E: Serialize> HecEvent<'a, E> {
    /// Wrap `event` with the metadata from `config`. Scope fields on the
    /// record override static fields of the same name.
    pub fn new(record: &'a HecLogRecord, config: &'a HecConfig, event: Option<E>) -> Self {
        let mut fields: BTreeMap<&str, &str> = config
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        fields.extend(
            record
                .scope_fields
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        Self {
            time: epoch_seconds(record.created),
            host: config.host.as_deref(),
            index: config.index.as_deref(),
            source: config.source.as_deref(),
            sourcetype: config.sourcetype.as_deref(),
            event,
            fields,
        }
    }
}

/// Transformer for the `/event` endpoint.
#[derive(Clone, Default)]
pub struct JsonPayloadTransformer {
    creator: Option<PayloadCreator>,
}

impl JsonPayloadTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `creator`'s value as the `event` payload. A JSON `null` omits it.
    pub fn with_creator(creator: PayloadCreator) -> Self {
        Self {
            creator: Some(creator),
        }
    }
}

impl PayloadTransformer for JsonPayloadTransformer {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Json
    }

    fn transform(
        &self,
        record: &HecLogRecord,
        config: &HecConfig,
    ) -> Result<String, TransformError> {
        let json = match &self.creator {
            None => serde_json::to_string(&HecEvent::new(record, config, Some(record)))?,
            Some(creator) => {
                let payload = creator(record);
                let payload = (!payload.is_null()).then_some(payload);
                serde_json::to_string(&HecEvent::new(record, config, payload))?
            }
        };
        Ok(json)
    }
}

impl fmt::Debug for JsonPayloadTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonPayloadTransformer")
            .field("custom_creator", &self.creator.is_some())
            .finish()
    }
}
