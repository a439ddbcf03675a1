//! Category loggers feeding the shared batch queue.
//!
//! A [`HecLogger`] filters by level, captures scopes, and serializes each
//! record on the calling thread. The resulting unit is appended to the
//! provider's [`BatchProcessor`]; network delivery happens on the worker.

mod convenience_methods;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use chrono::Utc;
use parking_lot::RwLock;
use thiserror::Error;

use crate::config::HecConfig;
use crate::level::HecLevel;
use crate::log_record::{EventId, ExceptionInfo, HecLogRecord};
use crate::processor::{BatchProcessor, ProcessorError};
use crate::scope::{self, ScopeGuard, ScopeProvider, ScopeValue};
use crate::transform::{SharedTransformer, TransformError};

/// Failure surfaced to the caller of [`HecLogger::log`].
#[derive(Debug, Error)]
pub enum LogError {
    #[error(transparent)]
    Transform(#[from] TransformError),
    /// The owning provider has shut down; the record was dropped.
    #[error("logger provider is shut down")]
    Closed,
}

impl From<ProcessorError> for LogError {
    fn from(err: ProcessorError) -> Self {
        match err {
            ProcessorError::Closed => Self::Closed,
        }
    }
}

/// Logger for one category.
pub struct HecLogger {
    name: String,
    level: AtomicU8,
    options: RwLock<Arc<HecConfig>>,
    scopes: RwLock<Arc<dyn ScopeProvider>>,
    transformer: SharedTransformer,
    processor: Arc<BatchProcessor>,
}

impl HecLogger {
    pub(crate) fn new(
        name: &str,
        options: Arc<HecConfig>,
        scopes: Arc<dyn ScopeProvider>,
        transformer: SharedTransformer,
        processor: Arc<BatchProcessor>,
    ) -> Self {
        Self {
            name: name.to_owned(),
            level: AtomicU8::new(u8::from(HecLevel::Trace)),
            options: RwLock::new(options),
            scopes: RwLock::new(scopes),
            transformer,
            processor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record one event.
    ///
    /// Filtered records and records with neither a message nor an exception
    /// return `Ok(())` without touching the queue. Serialization errors are
    /// returned as [`LogError::Transform`].
    pub fn log(
        &self,
        level: HecLevel,
        event: impl Into<EventId>,
        message: &str,
        exception: Option<ExceptionInfo>,
    ) -> Result<(), LogError> {
        let options = self.options();
        if !self.passes_level(level, &options) {
            return Ok(());
        }
        if message.is_empty() && exception.is_none() {
            return Ok(());
        }

        let mut record = HecLogRecord::at(
            Utc::now(),
            options.timestamp_format(),
            &self.name,
            level,
            message,
        )
        .with_event(event.into())
        .with_exception(exception);
        if options.include_scopes {
            let provider = self.scope_provider();
            let (scopes, fields) = scope::capture(provider.as_ref());
            record = record.with_scopes(scopes, fields);
        }

        let unit = self.transformer.transform(&record, &options)?;
        self.processor.enqueue(unit)?;
        Ok(())
    }

    /// Log `err` and its source chain at `level`.
    pub fn log_error<E>(&self, level: HecLevel, message: &str, err: &E) -> Result<(), LogError>
    where
        E: std::error::Error + ?Sized,
    {
        self.log(
            level,
            EventId::default(),
            message,
            Some(ExceptionInfo::from_error(err)),
        )
    }

    /// Push `value` onto the active scope stack until the guard drops.
    pub fn begin_scope(&self, value: impl Into<ScopeValue>) -> ScopeGuard {
        self.scope_provider().push(value.into())
    }

    /// Whether a record at `level` would pass both the logger threshold and
    /// the configured minimum level.
    pub fn is_enabled(&self, level: HecLevel) -> bool {
        self.passes_level(level, &self.options())
    }

    /// Update the logger's own threshold.
    pub fn set_level(&self, level: HecLevel) {
        self.level.store(u8::from(level), Ordering::Relaxed);
    }

    pub fn level(&self) -> HecLevel {
        HecLevel::from(self.level.load(Ordering::Relaxed))
    }

    fn passes_level(&self, level: HecLevel, options: &HecConfig) -> bool {
        level >= self.level() && level >= options.min_level
    }

    pub(crate) fn options(&self) -> Arc<HecConfig> {
        Arc::clone(&self.options.read())
    }

    pub(crate) fn update_options(&self, options: Arc<HecConfig>) {
        *self.options.write() = options;
    }

    fn scope_provider(&self) -> Arc<dyn ScopeProvider> {
        Arc::clone(&self.scopes.read())
    }

    pub(crate) fn set_scope_provider(&self, provider: Arc<dyn ScopeProvider>) {
        *self.scopes.write() = provider;
    }
}

impl fmt::Debug for HecLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HecLogger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("transformer", &self.transformer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "logger_tests.rs"]
mod logger_tests;
