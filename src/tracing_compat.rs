//! Bridge from `tracing` events into the collector pipeline.
//!
//! [`HecLayer`] is a `tracing_subscriber` layer. The `message` field of each
//! event becomes the record message; every other field is pushed as a
//! key/value scope around that one record, so it reaches the payload when
//! scopes are enabled.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::level::HecLevel;
use crate::log_record::EventId;
use crate::provider::HecLoggerProvider;
use crate::scope::ScopeValue;

const MESSAGE_FIELD: &str = "message";

/// Layer forwarding events to the logger named after the event target.
pub struct HecLayer {
    provider: Arc<HecLoggerProvider>,
}

impl HecLayer {
    pub fn new(provider: Arc<HecLoggerProvider>) -> Self {
        Self { provider }
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: BTreeMap<String, String>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: String) {
        if field.name() == MESSAGE_FIELD {
            self.message = value;
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.to_string());
    }
}

impl<S: Subscriber> Layer<S> for HecLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if crate::is_pipeline_record(metadata.target()) {
            return;
        }
        let level = HecLevel::from(*metadata.level());
        let logger = self
            .provider
            .create_logger(&metadata.target().replace("::", "."));
        if !logger.is_enabled(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let _scope = (!visitor.fields.is_empty())
            .then(|| logger.begin_scope(ScopeValue::Fields(visitor.fields)));
        if let Err(err) = logger.log(level, EventId::default(), &visitor.message, None) {
            eprintln!(
                "hec_logging: failed to forward tracing event for {:?}: {err}",
                metadata.target()
            );
        }
    }
}
