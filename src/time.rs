//! Monotonic millisecond clock used by every broker decision.
//!
//! The broker never reads a clock itself; it asks a [`Clock`] exactly once
//! per operation and threads the resulting `now` through the queue and AQM
//! machinery. That keeps the whole decision path a pure function of
//! `(now, state)`, which is what makes [`testing::TestClock`] a drop-in
//! replacement in tests.

use std::sync::Arc;

use tokio::time::Instant;

/// A millisecond timestamp. Always non-negative and non-decreasing within
/// the lifetime of a single [`Clock`].
pub type Millis = u64;

/// Source of monotonic time for the broker.
pub trait Clock: Send + Sync + 'static {
    /// Current time in milliseconds, monotonically non-decreasing.
    fn now_ms(&self) -> Millis;
}

/// Production clock, anchored at construction time so the broker only ever
/// deals in small millisecond offsets rather than wall-clock epoch values.
#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        self.epoch.elapsed().as_millis() as Millis
    }
}

/// A `Clock` trait object, the form every broker-facing API takes.
pub type SharedClock = Arc<dyn Clock>;

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    //! Test doubles for [`super::Clock`].

    use parking_lot::Mutex;

    use super::*;

    /// A hand-advanced clock for deterministic tests.
    ///
    /// Unlike `tokio::time::pause()`, this does not require the broker's
    /// task and the test's assertions to agree on a paused runtime; the
    /// broker just reads whatever value was last set.
    #[derive(Debug, Clone, Default)]
    pub struct TestClock {
        now: Arc<Mutex<Millis>>,
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                now: Arc::new(Mutex::new(0)),
            }
        }

        /// Set the clock to an absolute time. Must be non-decreasing.
        pub fn set(&self, now_ms: Millis) {
            let mut guard = self.now.lock();
            assert!(
                now_ms >= *guard,
                "TestClock must be monotonic: {now_ms} < {}",
                *guard
            );
            *guard = now_ms;
        }

        /// Advance the clock by `delta_ms`.
        pub fn advance(&self, delta_ms: Millis) {
            let mut guard = self.now.lock();
            *guard += delta_ms;
        }
    }

    impl Clock for TestClock {
        fn now_ms(&self) -> Millis {
            *self.now.lock()
        }
    }
}
