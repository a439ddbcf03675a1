//! Wait/drain loop executed by the batch worker.
//!
//! ```text
//! Waiting -> Draining -> Waiting ... -> ShuttingDown -> Stopped
//! ```
//!
//! The worker sleeps on the shared condition variable and never polls. It
//! holds the queue lock only while deciding what to do and while moving a
//! batch out of the queue; the sink runs with the lock released.

use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use log::warn;
use parking_lot::MutexGuard;

use super::{BatchSink, QueueState, Shared};

/// Observable phase of the worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    Waiting,
    Draining,
    ShuttingDown,
    Stopped,
}

fn has_work(state: &QueueState) -> bool {
    state.shutdown
        || state.queue.len() >= state.settings.batch_size
        || (!state.flush_requests.is_empty() && !state.queue.is_empty())
}

/// Block until there is work or the batch interval elapses.
fn wait_for_work(shared: &Shared, state: &mut MutexGuard<'_, QueueState>) {
    state.worker = WorkerState::Waiting;
    let mut deadline = state.settings.interval.map(|i| Instant::now() + i);
    loop {
        if has_work(state) {
            return;
        }
        if std::mem::take(&mut state.settings_changed) {
            deadline = state.settings.interval.map(|i| Instant::now() + i);
            continue;
        }
        match deadline {
            Some(deadline) => {
                if shared.signal.wait_until(state, deadline).timed_out() {
                    return;
                }
            }
            None => shared.signal.wait(state),
        }
    }
}

thread_local! {
    static DELIVERING: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is inside a [`BatchSink::deliver`] call made
/// by a batch worker. Log records raised there come from the delivery path
/// itself, including the HTTP stack, and must not be re-enqueued.
pub(crate) fn in_delivery() -> bool {
    DELIVERING.with(Cell::get)
}

/// Marks the current thread as delivering until dropped.
struct DeliveryMark;

impl DeliveryMark {
    fn enter() -> Self {
        DELIVERING.with(|flag| flag.set(true));
        Self
    }
}

impl Drop for DeliveryMark {
    fn drop(&mut self) {
        DELIVERING.with(|flag| flag.set(false));
    }
}

fn deliver(sink: &dyn BatchSink, batch: Vec<String>) {
    let _mark = DeliveryMark::enter();
    if catch_unwind(AssertUnwindSafe(|| sink.deliver(batch))).is_err() {
        warn!("HEC batch processor: batch sink panicked; batch discarded");
    }
}

/// Publishes `Stopped` when the worker exits, even by unwinding.
struct StopGuard<'a>(&'a Shared);

impl Drop for StopGuard<'_> {
    fn drop(&mut self) {
        self.0.state.lock().worker = WorkerState::Stopped;
        self.0.stopped.notify_all();
    }
}

pub(super) fn run(shared: &Shared, sink: &dyn BatchSink) {
    let _stop = StopGuard(shared);
    let mut state = shared.state.lock();
    loop {
        state.ack_completed_flushes();
        wait_for_work(shared, &mut state);

        state.worker = if state.shutdown {
            WorkerState::ShuttingDown
        } else {
            WorkerState::Draining
        };
        let take = state.settings.batch_size.min(state.queue.len());
        let batch: Vec<String> = state.queue.drain(..take).collect();
        if !batch.is_empty() {
            MutexGuard::unlocked(&mut state, || deliver(sink, batch));
        }
        state.delivered += take as u64;
        state.ack_completed_flushes();

        if state.shutdown && state.queue.is_empty() {
            break;
        }
    }
}
