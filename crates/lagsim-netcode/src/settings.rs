//! Tunable settings for the server and its clients
//!
//! Client settings live behind a shared [`SettingsHandle`]: the client reads
//! them at the start of every tick, the server reads the lag when it picks
//! that client's broadcast delay, and an outside configuration source may
//! change them at any time between ticks.

use lagsim_core::TickRate;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Loosest press duration the server accepts, in seconds
///
/// Wider than one 60 Hz client tick to tolerate client timer jitter. This is
/// a tunable threshold, not part of the protocol.
pub const DEFAULT_MAX_PRESS_DURATION: f64 = 1.0 / 40.0;

fn default_server_tick_rate() -> TickRate {
    TickRate::per_second(5)
}

fn default_client_tick_rate() -> TickRate {
    TickRate::per_second(60)
}

fn default_spawn_position() -> f64 {
    5.0
}

fn default_entity_speed() -> f64 {
    2.0
}

fn default_max_press_duration() -> f64 {
    DEFAULT_MAX_PRESS_DURATION
}

fn default_lag_ms() -> u64 {
    250
}

/// Server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Authoritative simulation rate
    #[serde(default = "default_server_tick_rate")]
    pub tick_rate: TickRate,
    /// Where newly connected entities appear
    #[serde(default = "default_spawn_position")]
    pub spawn_position: f64,
    /// Speed given to newly connected entities
    #[serde(default = "default_entity_speed")]
    pub entity_speed: f64,
    /// Inputs pressing longer than this many seconds are rejected
    #[serde(default = "default_max_press_duration")]
    pub max_press_duration: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: default_server_tick_rate(),
            spawn_position: default_spawn_position(),
            entity_speed: default_entity_speed(),
            max_press_duration: default_max_press_duration(),
        }
    }
}

/// Per-client settings, each toggle independent of the others
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Client loop rate
    #[serde(default = "default_client_tick_rate")]
    pub tick_rate: TickRate,
    /// One-way delay in milliseconds, applied in both directions
    #[serde(default = "default_lag_ms")]
    pub lag_ms: u64,
    /// Apply own inputs locally before the server confirms them
    #[serde(default)]
    pub use_prediction: bool,
    /// Replay unacknowledged inputs on top of each authoritative snapshot
    #[serde(default)]
    pub use_reconciliation: bool,
    /// Blend remote entities between the two latest snapshots
    #[serde(default)]
    pub use_entity_interpolation: bool,
}

impl ClientSettings {
    /// Channel delay for this client
    pub fn lag(&self) -> Duration {
        Duration::from_millis(self.lag_ms)
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            tick_rate: default_client_tick_rate(),
            lag_ms: default_lag_ms(),
            use_prediction: false,
            use_reconciliation: false,
            use_entity_interpolation: false,
        }
    }
}

/// Shared, live view of one client's settings
#[derive(Debug, Clone, Default)]
pub struct SettingsHandle {
    inner: Arc<RwLock<ClientSettings>>,
}

impl SettingsHandle {
    /// Wrap initial settings
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Current settings
    pub fn get(&self) -> ClientSettings {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace all settings
    pub fn set(&self, settings: ClientSettings) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    /// Change settings in place
    pub fn update(&self, f: impl FnOnce(&mut ClientSettings)) {
        f(&mut self.inner.write().unwrap_or_else(PoisonError::into_inner));
    }
}
