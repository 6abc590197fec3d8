//! Time sources for wall-clock driven actors
//!
//! Every actor and every lagged channel asks a [`Clock`] for "now":
//! - `Timestamp` - Monotonic offset from a clock's epoch
//! - `Clock` - Trait queried by senders and receivers
//! - `SystemClock` - Real monotonic time (tokio's `Instant`, so paused test time applies)
//! - `ManualClock` - Manually advanced time for deterministic tests
//!
//! No clock synchronization between actors is modeled; all actors of one
//! simulation share clones of the same clock.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A point in time, measured as an offset from the owning clock's epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(Duration);

impl Timestamp {
    /// The clock's epoch
    pub const ZERO: Timestamp = Timestamp(Duration::ZERO);

    /// Create a timestamp `ms` milliseconds after the epoch
    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    /// Offset since the epoch
    pub fn offset(&self) -> Duration {
        self.0
    }

    /// Whole milliseconds since the epoch
    pub fn as_millis(&self) -> u128 {
        self.0.as_millis()
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later
    pub fn saturating_since(&self, earlier: Timestamp) -> Duration {
        self.0.saturating_sub(earlier.0)
    }

    /// Signed difference `self - other` in seconds
    pub fn seconds_since(&self, other: Timestamp) -> f64 {
        self.0.as_secs_f64() - other.0.as_secs_f64()
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Self::Output {
        Timestamp(self.0 + rhs)
    }
}

impl AddAssign<Duration> for Timestamp {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs;
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t+{}ms", self.0.as_millis())
    }
}

/// Source of the current time
///
/// Implementations must never go backwards: subsequent calls return
/// timestamps `>=` earlier ones.
pub trait Clock: Clone + fmt::Debug + Send + Sync + 'static {
    /// Current time
    fn now(&self) -> Timestamp;
}

/// Real monotonic time measured from the moment the clock was created
///
/// Clones share the epoch, so timestamps taken by different actors are
/// comparable.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: tokio::time::Instant,
}

impl SystemClock {
    /// Create a clock whose epoch is now
    pub fn new() -> Self {
        Self {
            epoch: tokio::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp(tokio::time::Instant::now().saturating_duration_since(self.epoch))
    }
}

/// Manually advanced clock
///
/// Starts at the epoch and moves only when told to. Clones share the same
/// underlying time, so advancing one advances all of them.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock stopped at the epoch
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `by`
    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Move time forward by `ms` milliseconds
    pub fn advance_millis(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Jump to `to`; ignored if `to` is in the past
    pub fn set(&self, to: Timestamp) {
        self.nanos
            .fetch_max(to.offset().as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(Duration::from_nanos(self.nanos.load(Ordering::SeqCst)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let other = clock.clone();
        assert_eq!(clock.now(), Timestamp::ZERO);

        other.advance_millis(150);
        assert_eq!(clock.now(), Timestamp::from_millis(150));
    }

    #[test]
    fn test_manual_clock_never_goes_backwards() {
        let clock = ManualClock::new();
        clock.set(Timestamp::from_millis(100));
        clock.set(Timestamp::from_millis(40));
        assert_eq!(clock.now(), Timestamp::from_millis(100));
    }

    #[test]
    fn test_timestamp_arithmetic() {
        let t = Timestamp::from_millis(250) + Duration::from_millis(50);
        assert_eq!(t.as_millis(), 300);
        assert_eq!(t.saturating_since(Timestamp::from_millis(400)), Duration::ZERO);
        assert!((t.seconds_since(Timestamp::from_millis(100)) - 0.2).abs() < 1e-12);
        assert_eq!(t.to_string(), "t+300ms");
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
