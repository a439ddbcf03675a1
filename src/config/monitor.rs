//! Holder for the current configuration snapshot with change notification.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::{ConfigError, HecConfig};

/// Callback invoked with each newly published snapshot.
pub type ConfigListener = Arc<dyn Fn(Arc<HecConfig>) + Send + Sync>;

/// Handle returned by [`ConfigMonitor::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Publishes configuration snapshots to subscribers.
///
/// Listeners run on the thread that calls [`update`](Self::update), after the
/// new snapshot is visible through [`current`](Self::current).
pub struct ConfigMonitor {
    current: RwLock<Arc<HecConfig>>,
    listeners: RwLock<Vec<(SubscriptionId, ConfigListener)>>,
    next_id: AtomicU64,
}

impl ConfigMonitor {
    pub fn new(initial: HecConfig) -> Result<Self, ConfigError> {
        initial.validate()?;
        Ok(Self {
            current: RwLock::new(Arc::new(initial)),
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn current(&self) -> Arc<HecConfig> {
        Arc::clone(&self.current.read())
    }

    /// Validate and publish `config`. On error the previous snapshot stays.
    pub fn update(&self, config: HecConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let snapshot = Arc::new(config);
        *self.current.write() = Arc::clone(&snapshot);
        // Snapshot the listener list so callbacks may subscribe or unsubscribe.
        let listeners: Vec<ConfigListener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(Arc::clone(&snapshot));
        }
        Ok(())
    }

    pub fn subscribe(&self, listener: ConfigListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        id
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        match listeners.iter().position(|(sid, _)| *sid == id) {
            Some(pos) => {
                listeners.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl fmt::Debug for ConfigMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigMonitor")
            .field("current", &self.current.read())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
