//! Owner of the pipeline shared by every category logger.
//!
//! One provider holds one client manager, one batch processor, and the
//! registry of loggers it has handed out. It subscribes to a
//! [`ConfigMonitor`] and pushes each new snapshot into all of them.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use log::{debug, warn};
use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use crate::config::{ConfigError, ConfigMonitor, HecConfig, SubscriptionId};
use crate::hec::{
    ClientError, ClientManager, Endpoint, HecDelivery, TransportFactory, UreqTransportFactory,
};
use crate::logger::HecLogger;
use crate::processor::{BatchProcessor, BatchSink};
use crate::scope::{ScopeProvider, ThreadLocalScopeProvider};
use crate::transform::SharedTransformer;

/// Failure while constructing or reloading a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to start batch worker: {0}")]
    Spawn(#[from] io::Error),
}

struct ProviderInner {
    monitor: Arc<ConfigMonitor>,
    subscription: Mutex<Option<SubscriptionId>>,
    /// Serializes reloads so their steps never interleave.
    reloading: Mutex<()>,
    options: RwLock<Arc<HecConfig>>,
    loggers: RwLock<HashMap<String, Arc<HecLogger>>>,
    scopes: RwLock<Arc<dyn ScopeProvider>>,
    transformer: SharedTransformer,
    clients: Arc<ClientManager>,
    delivery: Arc<HecDelivery>,
    processor: Arc<BatchProcessor>,
    shut_down: AtomicBool,
}

impl ProviderInner {
    fn reload(&self, snapshot: Arc<HecConfig>) -> Result<(), ProviderError> {
        let _reloading = self.reloading.lock();
        self.apply(snapshot)
    }

    /// Reload from the monitor's current snapshot rather than the one handed
    /// to the listener. Listeners of concurrent updates may run in either
    /// order, but whichever applies last reads the newest snapshot.
    fn reload_from_monitor(&self) -> Result<(), ProviderError> {
        let _reloading = self.reloading.lock();
        self.apply(self.monitor.current())
    }

    fn apply(&self, snapshot: Arc<HecConfig>) -> Result<(), ProviderError> {
        snapshot.validate()?;
        *self.options.write() = Arc::clone(&snapshot);
        for logger in self.loggers.read().values() {
            logger.update_options(Arc::clone(&snapshot));
        }
        self.processor.reconfigure(snapshot.batch_settings());
        self.clients.reload(snapshot)?;
        Ok(())
    }
}

/// Entry point: hands out [`HecLogger`]s and owns their delivery pipeline.
///
/// Dropping the provider shuts it down, draining queued events first.
pub struct HecLoggerProvider {
    inner: Arc<ProviderInner>,
}

impl HecLoggerProvider {
    /// Build the pipeline with the production HTTP transport.
    ///
    /// The endpoint is the one `transformer` produces payloads for.
    pub fn new(
        monitor: Arc<ConfigMonitor>,
        transformer: impl Into<SharedTransformer>,
    ) -> Result<Self, ProviderError> {
        Self::with_transport_factory(monitor, transformer, Arc::new(UreqTransportFactory))
    }

    /// Build the pipeline with a caller-supplied transport factory.
    pub fn with_transport_factory(
        monitor: Arc<ConfigMonitor>,
        transformer: impl Into<SharedTransformer>,
        factory: Arc<dyn TransportFactory>,
    ) -> Result<Self, ProviderError> {
        let transformer = transformer.into();
        let options = monitor.current();
        options.validate()?;

        let clients = Arc::new(ClientManager::new(
            transformer.endpoint(),
            factory,
            Arc::clone(&options),
        )?);
        let delivery = Arc::new(HecDelivery::new(Arc::clone(&clients)));
        let sink: Arc<dyn BatchSink> = Arc::clone(&delivery) as Arc<dyn BatchSink>;
        let processor = Arc::new(BatchProcessor::new(options.batch_settings(), sink)?);

        let inner = Arc::new(ProviderInner {
            monitor: Arc::clone(&monitor),
            subscription: Mutex::new(None),
            reloading: Mutex::new(()),
            options: RwLock::new(options),
            loggers: RwLock::new(HashMap::new()),
            scopes: RwLock::new(Arc::new(ThreadLocalScopeProvider::new())),
            transformer,
            clients,
            delivery,
            processor,
            shut_down: AtomicBool::new(false),
        });

        let weak: Weak<ProviderInner> = Arc::downgrade(&inner);
        let id = monitor.subscribe(Arc::new(move |_snapshot: Arc<HecConfig>| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.shut_down.load(Ordering::Acquire) {
                return;
            }
            if let Err(err) = inner.reload_from_monitor() {
                warn!("HEC logger provider: configuration reload failed: {err}");
            }
        }));
        *inner.subscription.lock() = Some(id);
        debug!(
            "HEC logger provider started for the {} endpoint",
            inner.transformer.endpoint().label()
        );
        Ok(Self { inner })
    }

    /// Return the logger for `category`, creating it on first use.
    pub fn create_logger(&self, category: &str) -> Arc<HecLogger> {
        if let Some(logger) = self.inner.loggers.read().get(category) {
            return Arc::clone(logger);
        }
        let mut loggers = self.inner.loggers.write();
        match loggers.entry(category.to_owned()) {
            Entry::Occupied(o) => Arc::clone(o.get()),
            Entry::Vacant(v) => {
                let logger = Arc::new(HecLogger::new(
                    category,
                    self.config(),
                    Arc::clone(&self.inner.scopes.read()),
                    self.inner.transformer.clone(),
                    Arc::clone(&self.inner.processor),
                ));
                v.insert(Arc::clone(&logger));
                logger
            }
        }
    }

    /// Replace the scope provider used by this provider and all its loggers.
    pub fn set_scope_provider(&self, provider: Arc<dyn ScopeProvider>) {
        *self.inner.scopes.write() = Arc::clone(&provider);
        for logger in self.inner.loggers.read().values() {
            logger.set_scope_provider(Arc::clone(&provider));
        }
    }

    /// Apply `snapshot` to every logger, the batch processor, and the client.
    ///
    /// A failed client rebuild leaves the previous client active.
    pub fn reload(&self, snapshot: Arc<HecConfig>) -> Result<(), ProviderError> {
        self.inner.reload(snapshot)
    }

    /// Deliver everything queued so far. See [`BatchProcessor::flush`].
    pub fn flush(&self, timeout: Duration) -> bool {
        self.inner.processor.flush(timeout)
    }

    /// Stop listening for configuration changes, drain the queue, and close
    /// the client. Every caller returns only after the drain has finished;
    /// repeated calls do nothing else.
    pub fn shutdown(&self) {
        let first = !self.inner.shut_down.swap(true, Ordering::AcqRel);
        if first {
            if let Some(id) = self.inner.subscription.lock().take() {
                self.inner.monitor.unsubscribe(id);
            }
        }
        self.inner.processor.shutdown();
        if first {
            self.inner.clients.close();
            debug!("HEC logger provider shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }

    pub fn config(&self) -> Arc<HecConfig> {
        Arc::clone(&self.inner.options.read())
    }

    pub fn endpoint(&self) -> Endpoint {
        self.inner.transformer.endpoint()
    }

    /// Events lost so far, either offered after shutdown or discarded by a
    /// failed delivery.
    pub fn dropped(&self) -> u64 {
        self.inner.processor.dropped() + self.inner.delivery.dropped()
    }
}

impl Drop for HecLoggerProvider {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for HecLoggerProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HecLoggerProvider")
            .field("endpoint", &self.endpoint())
            .field("loggers", &self.inner.loggers.read().len())
            .field("processor", &self.inner.processor)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod provider_tests;
