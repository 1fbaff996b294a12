//! Injected monotonic time sources.
//!
//! The collector never looks up a global clock. Whoever drives it supplies
//! the arrival time of every event, usually by asking a [`Clock`]. Tests use
//! [`ManualClock`] to replay exact scenarios; the async driver uses
//! [`MonotonicClock`], which follows Tokio's clock and therefore also honours
//! paused time in `#[tokio::test(start_paused = true)]`.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use tokio::time::Instant;

/// Milliseconds on a monotonic timeline.
///
/// Signed so that a clock anomaly (an event stamped earlier than its
/// predecessor) is representable and yields a negative interval instead of
/// an underflow.
pub type Millis = i64;

/// A monotonic time source measured in milliseconds.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> Millis;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_ms(&self) -> Millis {
        (**self).now_ms()
    }
}

/// Clock backed by [`tokio::time::Instant`], measured from its creation.
///
/// # Examples
///
/// ```
/// use logiscan_core::{Clock, MonotonicClock};
///
/// let clock = MonotonicClock::new();
/// let a = clock.now_ms();
/// let b = clock.now_ms();
/// assert!(b >= a);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock whose zero is the current instant.
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
    fn now_ms(&self) -> Millis {
        i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(Millis::MAX)
    }
}

/// Manually advanced clock for tests and trace replay.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// hand another to the code under test.
///
/// # Examples
///
/// ```
/// use logiscan_core::{Clock, ManualClock};
///
/// let clock = ManualClock::new(0);
/// let shared = clock.clone();
///
/// clock.advance(10);
/// assert_eq!(shared.now_ms(), 10);
///
/// clock.set(5);
/// assert_eq!(shared.now_ms(), 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    /// Create a clock reading `start` milliseconds.
    pub fn new(start: Millis) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start)),
        }
    }

    /// Move the clock forward by `delta_ms` (or backward, if negative).
    pub fn advance(&self, delta_ms: Millis) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Set the clock to an absolute reading.
    pub fn set(&self, ms: Millis) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}
