//! Injectable time source for timing records.
//!
//! Provides [`Clock`], which every timing record reads its start and stop
//! markers from. The system clock is used by default; tests swap in a
//! [`MockClock`] (feature `test-utils`) to get deterministic durations.

use std::sync::Arc;
#[cfg(any(test, feature = "test-utils"))]
use std::time::Duration;
use std::time::Instant;

// ─────────────────────────────────────────────────────────────────────────────
// ClockProvider Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for providing current time.
///
/// Implement this for custom time providers (e.g., mock clock for testing).
///
/// # Example
///
/// ```
/// use std::time::Instant;
/// use tapscope_profiler::ClockProvider;
///
/// /// A clock that always returns a fixed instant.
/// struct FixedClock(Instant);
///
/// impl ClockProvider for FixedClock {
///     fn now(&self) -> Instant {
///         self.0
///     }
/// }
/// ```
pub trait ClockProvider: Send + Sync + 'static {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// System clock provider using `std::time::Instant`.
#[derive(Debug, Clone, Copy, Default)]
struct SystemClock;

impl ClockProvider for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Clock
// ─────────────────────────────────────────────────────────────────────────────

/// Time provider used for start and stop markers.
#[derive(Clone)]
pub struct Clock {
    provider: Arc<dyn ClockProvider>,
}

impl Clock {
    /// Creates a Clock using the system clock.
    #[must_use]
    pub fn system() -> Self {
        Self {
            provider: Arc::new(SystemClock),
        }
    }

    /// Creates a Clock with a custom provider.
    #[must_use]
    pub fn with_provider(provider: Arc<dyn ClockProvider>) -> Self {
        Self { provider }
    }

    /// Returns the current instant.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.provider.now()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MockClock for Testing
// ─────────────────────────────────────────────────────────────────────────────

/// Mock clock for testing with controllable time.
///
/// Optionally advances by a fixed step on every read, so each start/stop
/// pair taken in sequence is exactly one step apart.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use std::time::{Duration, Instant};
/// use tapscope_profiler::{MockClock, ProfilingPlugin};
///
/// let mock = Arc::new(MockClock::new(Instant::now()));
/// let profiler = ProfilingPlugin::new().with_clock(mock.clone());
///
/// // Later, advance time
/// mock.advance(Duration::from_millis(5));
/// ```
#[cfg(any(test, feature = "test-utils"))]
pub struct MockClock {
    current: parking_lot::RwLock<Instant>,
    step: Duration,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockClock {
    /// Creates a mock clock set to the given instant.
    #[must_use]
    pub fn new(start: Instant) -> Self {
        Self {
            current: parking_lot::RwLock::new(start),
            step: Duration::ZERO,
        }
    }

    /// Creates a mock clock that advances by `step` after every read.
    #[must_use]
    pub fn stepping(start: Instant, step: Duration) -> Self {
        Self {
            current: parking_lot::RwLock::new(start),
            step,
        }
    }

    /// Advances the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        *self.current.write() += duration;
    }

    /// Sets the clock to a specific instant.
    pub fn set(&self, instant: Instant) {
        *self.current.write() = instant;
    }

    /// Returns the current instant without stepping.
    #[must_use]
    pub fn current(&self) -> Instant {
        *self.current.read()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl ClockProvider for MockClock {
    fn now(&self) -> Instant {
        let mut current = self.current.write();
        let now = *current;
        *current += self.step;
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_default_uses_system_time() {
        let clock = Clock::default();
        let before = Instant::now();
        let clock_now = clock.now();
        let after = Instant::now();

        assert!(clock_now >= before);
        assert!(clock_now <= after);
    }

    #[test]
    fn mock_clock_advance() {
        let mock = MockClock::new(Instant::now());
        let initial = mock.current();

        mock.advance(Duration::from_secs(60));

        let after = mock.current();
        assert_eq!(after.duration_since(initial), Duration::from_secs(60));
    }

    #[test]
    fn mock_clock_set() {
        let mock = MockClock::new(Instant::now());
        let target = Instant::now() + Duration::from_secs(100);

        mock.set(target);

        assert_eq!(mock.current(), target);
    }

    #[test]
    fn stepping_mock_clock_advances_per_read() {
        let start = Instant::now();
        let mock = MockClock::stepping(start, Duration::from_millis(5));

        assert_eq!(mock.now(), start);
        assert_eq!(mock.now(), start + Duration::from_millis(5));
        assert_eq!(mock.current(), start + Duration::from_millis(10));
    }
}
