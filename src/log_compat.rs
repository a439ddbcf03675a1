//! Compatibility bridge for the Rust `log` crate.
//!
//! [`HecLogAdapter`] implements `log::Log` and forwards each record to the
//! provider's logger for the record's target. Install it process-wide with
//! [`install_global_logger`].

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use log::{Metadata, Record, SetLoggerError};

use crate::level::HecLevel;
use crate::log_record::EventId;
use crate::logger::LogError;
use crate::provider::HecLoggerProvider;

const ADAPTER_FLUSH_TIMEOUT: Duration = Duration::from_millis(2_000);

/// Adapter implementing the Rust `log::Log` trait.
///
/// The record target becomes the logger category, with `::` rewritten to
/// `.`. Records emitted by this crate or its HTTP stack, and any record
/// raised on a worker while it delivers a batch, are ignored so the
/// pipeline's own output never re-enters it.
pub struct HecLogAdapter {
    provider: Arc<HecLoggerProvider>,
}

impl HecLogAdapter {
    pub fn new(provider: Arc<HecLoggerProvider>) -> Self {
        Self { provider }
    }
}

fn normalise_target(target: &str) -> Cow<'_, str> {
    if target.contains("::") {
        Cow::Owned(target.replace("::", "."))
    } else {
        Cow::Borrowed(target)
    }
}

fn is_enabled_by_global_max(level: log::Level) -> bool {
    log::max_level() >= level.to_level_filter()
}

impl log::Log for HecLogAdapter {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        is_enabled_by_global_max(metadata.level())
            && !crate::is_pipeline_record(metadata.target())
            && HecLevel::from(metadata.level()) >= self.provider.config().min_level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let logger = self
            .provider
            .create_logger(normalise_target(record.target()).as_ref());
        let level = HecLevel::from(record.level());
        if !logger.is_enabled(level) {
            return;
        }
        let message = record.args().to_string();
        match logger.log(level, EventId::default(), &message, None) {
            // Already counted by the processor.
            Ok(()) | Err(LogError::Closed) => {}
            Err(err) => eprintln!(
                "hec_logging: failed to forward record for target {:?}: {err}",
                record.target()
            ),
        }
    }

    fn flush(&self) {
        self.provider.flush(ADAPTER_FLUSH_TIMEOUT);
    }
}

/// Install an adapter over `provider` as the global Rust logger.
///
/// Fails when a global logger is already set.
pub fn install_global_logger(provider: Arc<HecLoggerProvider>) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(HecLogAdapter::new(provider)))?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
