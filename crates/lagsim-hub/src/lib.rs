//! Lagsim Hub - Running a lag-simulated session in real time
//!
//! This crate turns the actors of `lagsim-netcode` into a live simulation:
//! one server and any number of clients, each ticked by its own timer.
//!
//! ## Architecture
//!
//! ```text
//! Hub (owns every actor)
//!  │
//!  ├── TickDriver ── Server        (server rate)
//!  │
//!  └── TickDriver ── Client[]      (per-client rate)
//!                     └── SettingsHandle (shared with the server's link)
//! ```
//!
//! ## Key Components
//!
//! - [`SimulationConfig`]: RON-backed description of server and clients
//! - [`TickDriver`]: tokio task calling `tick()` at a fixed, changeable rate
//! - [`Hub`]: Builds and connects actors, starts and stops their drivers
//!
//! Rate changes cancel the running timer and start a new one; no actor
//! state is lost and a tick is never run concurrently with another tick of
//! the same actor.

mod config;
mod driver;
mod error;
mod hub;

pub use config::{ClientConfig, SimulationConfig};
pub use driver::{stop_all, DriverHandle, DriverState, TickDriver};
pub use error::{Error, Result};
pub use hub::{ClientView, Hub};
