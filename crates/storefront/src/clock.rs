//! Wall-clock abstraction.
//!
//! Cache TTLs and the cart's short feedback windows are all "is now past
//! this deadline" checks. Routing them through a `Clock` lets tests move
//! time instead of sleeping.

use chrono::Utc;

/// Source of the current time as milliseconds since the Unix epoch.
pub trait Clock: Send + Sync + 'static {
    /// Current time in epoch milliseconds.
    fn now_millis(&self) -> i64;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A manually advanced clock for tests.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(std::sync::Arc<std::sync::atomic::AtomicI64>);

impl ManualClock {
    /// Create a clock fixed at the given epoch-millisecond instant.
    #[must_use]
    pub fn at(millis: i64) -> Self {
        let clock = Self::default();
        clock.0.store(millis, std::sync::atomic::Ordering::SeqCst);
        clock
    }

    /// Advance the clock by `millis`.
    pub fn advance(&self, millis: i64) {
        self.0.fetch_add(millis, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}
