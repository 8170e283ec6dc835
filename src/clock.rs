//! Time sources for cache staleness.
//!
//! The physics manager reads time through the [`Clock`] trait so tests can
//! drive staleness deterministically with a [`ManualClock`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source measured from an arbitrary origin.
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Wall-clock time source backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Starts a clock at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock.
///
/// Clones share the same underlying time so a test can keep one handle while
/// the manager owns another.
///
/// ```
/// use std::time::Duration;
/// use gravwell::clock::{Clock, ManualClock};
/// let clock = ManualClock::default();
/// let handle = clock.clone();
/// handle.advance(Duration::from_millis(20));
/// assert_eq!(clock.now(), Duration::from_millis(20));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let step = u64::try_from(delta.as_micros()).unwrap_or(u64::MAX);
        self.micros.fetch_add(step, Ordering::SeqCst);
    }

    /// Sets the clock to an absolute time.
    pub fn set(&self, now: Duration) {
        let micros = u64::try_from(now.as_micros()).unwrap_or(u64::MAX);
        self.micros.store(micros, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::default();
        let other = clock.clone();
        other.advance(Duration::from_millis(5));
        clock.advance(Duration::from_millis(7));
        assert_eq!(other.now(), Duration::from_millis(12));
        clock.set(Duration::from_secs(1));
        assert_eq!(other.now(), Duration::from_secs(1));
    }

    #[rstest]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
