//! Actors driven by fixed-rate timers
//!
//! The server and every client are actors: each owns its state exclusively
//! and advances it one tick at a time at its own rate. Schedulers only see
//! the [`Actor`] trait.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Longest period a tick rate may have
pub const MAX_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Ticks per second
///
/// Always finite and strictly positive, with a period in `(0, MAX_PERIOD]`
/// so every timer built from it is valid.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct TickRate(f64);

impl TickRate {
    /// Create a tick rate, rejecting zero, negative and non-finite values
    /// as well as rates too fast or too slow to express as a period
    pub fn new(hz: f64) -> Result<Self> {
        if !(hz.is_finite() && hz > 0.0) {
            return Err(Error::InvalidTickRate(hz));
        }
        match Duration::try_from_secs_f64(1.0 / hz) {
            Ok(period) if !period.is_zero() && period <= MAX_PERIOD => Ok(Self(hz)),
            _ => Err(Error::InvalidTickRate(hz)),
        }
    }

    /// Whole ticks per second; zero is raised to one
    pub fn per_second(hz: u16) -> Self {
        Self(f64::from(hz.max(1)))
    }

    /// Ticks per second
    pub fn hz(&self) -> f64 {
        self.0
    }

    /// Time between two ticks
    pub fn period(&self) -> Duration {
        // In range for every rate `new` accepts
        Duration::try_from_secs_f64(1.0 / self.0).unwrap_or(MAX_PERIOD)
    }
}

impl TryFrom<f64> for TickRate {
    type Error = Error;

    fn try_from(hz: f64) -> Result<Self> {
        Self::new(hz)
    }
}

impl From<TickRate> for f64 {
    fn from(rate: TickRate) -> Self {
        rate.0
    }
}

impl fmt::Display for TickRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Hz", self.0)
    }
}

/// Something advanced by a fixed-rate ticker
///
/// A tick runs to completion without yielding; schedulers guarantee at most
/// one `tick` in flight per actor.
pub trait Actor: Send + 'static {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Rate the actor wants to be ticked at
    fn tick_rate(&self) -> TickRate;

    /// Run one tick
    fn tick(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_rate_validation() {
        assert!(TickRate::new(60.0).is_ok());
        assert!(matches!(TickRate::new(0.0), Err(Error::InvalidTickRate(_))));
        assert!(TickRate::new(-5.0).is_err());
        assert!(TickRate::new(f64::NAN).is_err());
        assert!(TickRate::new(f64::INFINITY).is_err());
        assert_eq!(TickRate::per_second(0).hz(), 1.0);
    }

    #[test]
    fn test_tick_rate_rejects_unrepresentable_periods() {
        // Period rounds to zero
        assert!(matches!(TickRate::new(1e12), Err(Error::InvalidTickRate(_))));
        // Period overflows Duration
        assert!(TickRate::new(1e-300).is_err());
        // Representable but slower than once a day
        assert!(TickRate::new(1e-6).is_err());

        let fastest = TickRate::new(1e9).unwrap();
        assert_eq!(fastest.period(), Duration::from_nanos(1));
        let hourly = TickRate::new(1.0 / 3600.0).unwrap();
        let period = hourly.period();
        assert!(period.abs_diff(Duration::from_secs(3600)) < Duration::from_millis(1));
    }

    #[test]
    fn test_tick_rate_period() {
        let rate = TickRate::new(5.0).unwrap();
        assert_eq!(rate.period(), Duration::from_millis(200));
        assert_eq!(rate.to_string(), "5Hz");
    }

    #[test]
    fn test_tick_rate_deserialize_rejects_zero() {
        let ok: TickRate = ron::from_str("60.0").unwrap();
        assert_eq!(ok.hz(), 60.0);
        assert!(ron::from_str::<TickRate>("0.0").is_err());
        assert!(ron::from_str::<TickRate>("1e12").is_err());
    }
}
