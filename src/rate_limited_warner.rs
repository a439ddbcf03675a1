use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Default spacing between dropped-unit warnings.
pub const DEFAULT_WARN_INTERVAL: Duration = Duration::from_secs(5);

const NEVER: u64 = u64::MAX;

/// Helper that rate limits warnings about lost units.
///
/// Callers bump the counter with [`record_drop`](Self::record_drop); the next
/// [`warn_if_due`](Self::warn_if_due) reports the accumulated count once the
/// interval has passed. [`flush`](Self::flush) reports immediately.
pub struct RateLimitedWarner {
    origin: Instant,
    interval: Duration,
    last_warn_ms: AtomicU64,
    dropped: AtomicU64,
    total: AtomicU64,
}

impl Default for RateLimitedWarner {
    fn default() -> Self {
        Self::new(DEFAULT_WARN_INTERVAL)
    }
}

impl RateLimitedWarner {
    /// The first warning may be emitted immediately.
    pub fn new(interval: Duration) -> Self {
        Self {
            origin: Instant::now(),
            interval,
            last_warn_ms: AtomicU64::new(NEVER),
            dropped: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    pub fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of drops recorded over the warner's lifetime.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX - 1)
    }

    pub fn warn_if_due(&self, mut warn: impl FnMut(u64)) {
        let now = self.elapsed_ms();
        let prev = self.last_warn_ms.load(Ordering::Relaxed);
        let due = prev == NEVER
            || u128::from(now.saturating_sub(prev)) >= self.interval.as_millis();
        if !due {
            return;
        }
        if self
            .last_warn_ms
            .compare_exchange(prev, now, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            // Another thread is reporting this window.
            return;
        }
        let count = self.dropped.swap(0, Ordering::Relaxed);
        if count > 0 {
            warn(count);
        }
    }

    pub fn flush(&self, mut warn: impl FnMut(u64)) {
        let count = self.dropped.swap(0, Ordering::Relaxed);
        if count > 0 {
            warn(count);
            self.last_warn_ms.store(self.elapsed_ms(), Ordering::Relaxed);
        }
    }
}
