//! Text rendering for the raw endpoint.
//!
//! ```text
//! 1700000000.123: INFO: app.http[12]
//!           => request 7 => user:42
//!           Request received
//!           second line of the message
//! ```

use std::fmt::{self, Write};
use std::sync::LazyLock;

use super::{PayloadCreator, PayloadTransformer, TransformError};
use crate::config::HecConfig;
use crate::hec::Endpoint;
use crate::level::HecLevel;
use crate::log_record::HecLogRecord;

const LEVEL_SEPARATOR: &str = ": ";

static MESSAGE_PADDING: LazyLock<String> =
    LazyLock::new(|| " ".repeat(HecLevel::max_label_width() + LEVEL_SEPARATOR.len()));

/// Transformer for the raw endpoint.
#[derive(Clone, Default)]
pub struct RawPayloadTransformer {
    creator: Option<PayloadCreator>,
}

impl RawPayloadTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the text layout with `creator`. String results are used as-is;
    /// any other JSON value is sent in its compact form.
    pub fn with_creator(creator: PayloadCreator) -> Self {
        Self {
            creator: Some(creator),
        }
    }

    /// Render `record` with the default text layout.
    pub fn render(record: &HecLogRecord) -> String {
        let mut out = String::with_capacity(128);
        // Writing to a String cannot fail.
        let _ = write_layout(&mut out, record);
        out
    }
}

fn write_layout(out: &mut String, record: &HecLogRecord) -> fmt::Result {
    let pad = MESSAGE_PADDING.as_str();
    writeln!(
        out,
        "{}{LEVEL_SEPARATOR}{}{LEVEL_SEPARATOR}{}[{}]",
        record.timestamp, record.level, record.category, record.event
    )?;

    if !record.scopes.is_empty() {
        out.push_str(pad);
        for (i, scope) in record.scopes.iter().enumerate() {
            out.push_str(if i == 0 { "=> " } else { " => " });
            out.push_str(scope);
        }
        out.push('\n');
    }

    if let Some(message) = record.message.as_deref().filter(|m| !m.is_empty()) {
        out.push_str(pad);
        let mut lines = message.split('\n');
        if let Some(first) = lines.next() {
            out.push_str(first);
        }
        for line in lines {
            out.push('\n');
            out.push_str(pad);
            out.push_str(line);
        }
        out.push('\n');
    }

    if let Some(exception) = &record.exception {
        writeln!(out, "{exception}")?;
    }
    Ok(())
}

impl PayloadTransformer for RawPayloadTransformer {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Raw
    }

    fn transform(
        &self,
        record: &HecLogRecord,
        _config: &HecConfig,
    ) -> Result<String, TransformError> {
        match &self.creator {
            None => Ok(Self::render(record)),
            Some(creator) => Ok(match creator(record) {
                serde_json::Value::String(text) => text,
                other => serde_json::to_string(&other)?,
            }),
        }
    }
}

impl fmt::Debug for RawPayloadTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawPayloadTransformer")
            .field("custom_creator", &self.creator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_record::{EventId, ExceptionInfo};
    use chrono::{DateTime, Utc};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn record(message: &str) -> HecLogRecord {
        let created = DateTime::<Utc>::from_timestamp(1_700_000_000, 123_000_000)
            .expect("valid timestamp");
        HecLogRecord::at(created, None, "app.http", HecLevel::Info, message)
            .with_event(EventId::new(12))
    }

    const PAD: &str = "          ";

    #[test]
    fn renders_header_and_message() {
        let text = RawPayloadTransformer::render(&record("Request received"));
        assert_eq!(
            text,
            format!("1700000000.123: INFO: app.http[12]\n{PAD}Request received\n")
        );
    }

    #[test]
    fn indents_multiline_messages() {
        let text = RawPayloadTransformer::render(&record("one\ntwo"));
        assert_eq!(
            text,
            format!("1700000000.123: INFO: app.http[12]\n{PAD}one\n{PAD}two\n")
        );
    }

    #[test]
    fn renders_scope_trail() {
        let rec = record("hi").with_scopes(
            vec!["request 7".into(), "user:42".into()],
            BTreeMap::new(),
        );
        let text = RawPayloadTransformer::render(&rec);
        assert!(text.contains(&format!("\n{PAD}=> request 7 => user:42\n{PAD}hi\n")));
    }

    #[test]
    fn renders_exception_after_message() {
        let rec = record("").with_exception(Some(ExceptionInfo::new("IoError", "boom")));
        let text = RawPayloadTransformer::render(&rec);
        assert_eq!(text, "1700000000.123: INFO: app.http[12]\nIoError: boom\n");
    }

    #[test]
    fn event_name_replaces_id() {
        let rec = record("x").with_event(EventId::named(12, "Startup"));
        assert!(
            RawPayloadTransformer::render(&rec)
                .starts_with("1700000000.123: INFO: app.http[Startup]")
        );
    }

    #[test]
    fn creator_string_is_used_verbatim() {
        let transformer =
            RawPayloadTransformer::with_creator(Arc::new(|r: &HecLogRecord| {
                serde_json::Value::from(r.category.clone())
            }));
        let out = transformer
            .transform(&record("ignored"), &HecConfig::default())
            .expect("transform");
        assert_eq!(out, "app.http");
    }

    #[test]
    fn creator_object_is_compact_json() {
        let transformer = RawPayloadTransformer::with_creator(Arc::new(|r: &HecLogRecord| {
            serde_json::json!({"lvl": r.level.as_str()})
        }));
        let out = transformer
            .transform(&record("ignored"), &HecConfig::default())
            .expect("transform");
        assert_eq!(out, r#"{"lvl":"INFO"}"#);
    }
}
