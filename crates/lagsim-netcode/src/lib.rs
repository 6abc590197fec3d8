//! Lagsim Netcode - Client-server synchronization under latency
//!
//! This crate provides the actors of a lag-simulated session:
//!
//! - **Server**: Validates and applies client inputs, broadcasts snapshots
//! - **Prediction**: Apply own inputs locally before server confirmation
//! - **Reconciliation**: Replay unacknowledged inputs on authoritative state
//! - **Interpolation**: Show remote entities between two real snapshots
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────┐   Input (lag)   ┌──────────────────┐
//! │            Client             │ ──────────────▶ │                  │
//! │  Controls ─▶ InputSampler     │                 │      Server      │
//! │     │            │            │                 │  validate/apply  │
//! │     ▼            ▼            │ WorldState(lag) │    broadcast     │
//! │  Prediction  PendingInputs    │ ◀────────────── │                  │
//! │     ▲            │            │                 └──────────────────┘
//! │     └── Reconciliation        │
//! │  Interpolator ─▶ remote view  │
//! └───────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use lagsim_core::ManualClock;
//! use lagsim_netcode::{Client, ClientSettings, Controls, Server, ServerConfig, SettingsHandle};
//!
//! let clock = ManualClock::new();
//! let mut server = Server::new(ServerConfig::default(), clock.clone());
//! let settings = ClientSettings { use_prediction: true, ..ClientSettings::default() };
//! let mut client = Client::new("p1", SettingsHandle::new(settings), clock.clone());
//! server.connect(&mut client).unwrap();
//!
//! server.update();
//! clock.advance_millis(250);
//! client.set_controls(Controls::RIGHT);
//! client.update();
//! assert_eq!(client.position(), Some(5.0));
//! ```

mod client;
mod error;
mod input_buffer;
mod interpolation;
mod prediction;
pub mod reconciliation;
mod server;
mod settings;
pub mod transport;

pub use client::{Client, ClientState};
pub use error::{Error, Rejection, Result};
pub use input_buffer::PendingInputs;
pub use interpolation::{Interpolator, SavedWorldState};
pub use prediction::{Controls, InputSampler};
pub use reconciliation::{reconcile, Reconciliation};
pub use server::{Server, ServerStats};
pub use settings::{ClientSettings, ServerConfig, SettingsHandle, DEFAULT_MAX_PRESS_DURATION};
pub use transport::{ClientLink, Connection};
