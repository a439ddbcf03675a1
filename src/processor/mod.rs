//! Batching queue drained by a dedicated worker thread.
//!
//! Producers append serialized units with [`BatchProcessor::enqueue`]; the
//! worker wakes when the queue reaches the batch size, when the batch interval
//! elapses, when a flush is requested, or when shutdown begins. Each wake
//! drains at most one batch from the head of the queue and hands it to the
//! [`BatchSink`] with the queue lock released, so producers never wait on
//! the network.
//!
//! Shutdown drains the queue to empty before the worker exits and blocks the
//! caller until then. Units offered after shutdown has begun are dropped.

mod worker;

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Sender, bounded};
use log::warn;
use parking_lot::{Condvar, Mutex};
use thiserror::Error;

use crate::config::{DEFAULT_BATCH_INTERVAL_MS, DEFAULT_BATCH_SIZE};
use crate::rate_limited_warner::RateLimitedWarner;

pub use worker::WorkerState;
pub(crate) use worker::in_delivery;

const WORKER_THREAD_NAME: &str = "hec-batch-worker";

/// Batch sizing and timing applied by the worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchSettings {
    /// Upper bound on units per batch; values below one are treated as one.
    pub batch_size: usize,
    /// Time trigger. `None` means batches flush on size, flush, or shutdown only.
    pub interval: Option<Duration>,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            interval: Some(Duration::from_millis(DEFAULT_BATCH_INTERVAL_MS)),
        }
    }
}

impl BatchSettings {
    fn normalised(self) -> Self {
        Self {
            batch_size: self.batch_size.max(1),
            interval: self.interval.filter(|i| !i.is_zero()),
        }
    }
}

/// Receiver of drained batches. Runs on the worker thread.
pub trait BatchSink: Send + Sync + 'static {
    fn deliver(&self, batch: Vec<String>);
}

impl<F> BatchSink for F
where
    F: Fn(Vec<String>) + Send + Sync + 'static,
{
    fn deliver(&self, batch: Vec<String>) {
        self(batch)
    }
}

/// Errors returned to producers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessorError {
    /// Shutdown has begun; the unit was dropped.
    #[error("batch processor is shut down")]
    Closed,
}

struct FlushRequest {
    /// Flush completes once this many units have been handed to the sink.
    target: u64,
    ack: Sender<()>,
}

struct QueueState {
    queue: VecDeque<String>,
    settings: BatchSettings,
    settings_changed: bool,
    shutdown: bool,
    flush_requests: Vec<FlushRequest>,
    accepted: u64,
    delivered: u64,
    worker: WorkerState,
}

impl QueueState {
    fn ack_completed_flushes(&mut self) {
        let delivered = self.delivered;
        self.flush_requests.retain(|req| {
            if req.target <= delivered {
                let _ = req.ack.send(());
                false
            } else {
                true
            }
        });
    }
}

struct Shared {
    state: Mutex<QueueState>,
    signal: Condvar,
    /// Notified once the worker has stopped.
    stopped: Condvar,
    disposed: AtomicBool,
    warner: RateLimitedWarner,
}

/// Thread-safe FIFO batch queue with its worker.
pub struct BatchProcessor {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl BatchProcessor {
    /// Start the worker thread.
    pub fn new(settings: BatchSettings, sink: Arc<dyn BatchSink>) -> io::Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                queue: VecDeque::new(),
                settings: settings.normalised(),
                settings_changed: false,
                shutdown: false,
                flush_requests: Vec::new(),
                accepted: 0,
                delivered: 0,
                worker: WorkerState::Waiting,
            }),
            signal: Condvar::new(),
            stopped: Condvar::new(),
            disposed: AtomicBool::new(false),
            warner: RateLimitedWarner::default(),
        });
        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker::run(&worker_shared, sink.as_ref()))?;
        Ok(Self {
            shared,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Append `unit` to the tail of the queue.
    ///
    /// Never waits on delivery. After shutdown has begun the unit is dropped,
    /// counted, and [`ProcessorError::Closed`] is returned.
    pub fn enqueue(&self, unit: String) -> Result<(), ProcessorError> {
        if self.shared.disposed.load(Ordering::Acquire) {
            return Err(self.reject());
        }
        let wake = {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                drop(state);
                return Err(self.reject());
            }
            state.queue.push_back(unit);
            state.accepted += 1;
            state.queue.len() >= state.settings.batch_size
        };
        if wake {
            self.shared.signal.notify_one();
        }
        Ok(())
    }

    fn reject(&self) -> ProcessorError {
        self.shared.warner.record_drop();
        self.shared.warner.warn_if_due(|count| {
            warn!("HEC batch processor: dropped {count} events after shutdown");
        });
        ProcessorError::Closed
    }

    /// Apply new settings; the worker picks them up on its next wait.
    pub fn reconfigure(&self, settings: BatchSettings) {
        {
            let mut state = self.shared.state.lock();
            state.settings = settings.normalised();
            state.settings_changed = true;
        }
        self.shared.signal.notify_one();
    }

    pub fn settings(&self) -> BatchSettings {
        self.shared.state.lock().settings
    }

    /// Deliver everything accepted so far regardless of size or interval.
    ///
    /// Returns `true` once those units have been handed to the sink, or
    /// `false` on timeout or after shutdown.
    pub fn flush(&self, timeout: Duration) -> bool {
        if self.shared.disposed.load(Ordering::Acquire) {
            return false;
        }
        let (ack_tx, ack_rx) = bounded(1);
        {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                return false;
            }
            let target = state.accepted;
            if target <= state.delivered {
                return true;
            }
            state.flush_requests.push(FlushRequest {
                target,
                ack: ack_tx,
            });
        }
        self.shared.signal.notify_one();
        ack_rx.recv_timeout(timeout).is_ok()
    }

    /// Drain the queue to empty, then stop the worker. Blocks until done,
    /// including for callers racing a shutdown already in progress.
    pub fn shutdown(&self) {
        self.shared.disposed.store(true, Ordering::Release);
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
        }
        self.shared.signal.notify_one();

        // Drop the lock before joining the worker thread.
        let handle = { self.handle.lock().take() };
        match handle {
            Some(handle) => log_join_result(handle),
            None => self.wait_until_stopped(),
        }
        self.shared.warner.flush(|count| {
            warn!("HEC batch processor: dropped {count} events after shutdown");
        });
    }

    fn wait_until_stopped(&self) {
        let mut state = self.shared.state.lock();
        while state.worker != WorkerState::Stopped {
            self.shared.stopped.wait(&mut state);
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.disposed.load(Ordering::Acquire)
    }

    /// Units waiting in the queue.
    pub fn pending(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Units rejected because shutdown had begun.
    pub fn dropped(&self) -> u64 {
        self.shared.warner.total()
    }

    pub fn worker_state(&self) -> WorkerState {
        self.shared.state.lock().worker
    }
}

fn log_join_result(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        warn!("HEC batch processor: worker thread panicked");
    }
}

impl Drop for BatchProcessor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for BatchProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("BatchProcessor")
            .field("pending", &state.queue.len())
            .field("settings", &state.settings)
            .field("worker", &state.worker)
            .finish()
    }
}
