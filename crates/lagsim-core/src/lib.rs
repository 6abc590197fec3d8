//! Lagsim Core - Building blocks for lag-simulated client/server play
//!
//! This crate provides the value types and plumbing shared by the server and
//! its clients:
//! - `Entity` - One-dimensional simulated object advanced by inputs
//! - `Input` / `WorldState` - Messages exchanged over the "wire"
//! - `LaggedChannel` - In-memory transport that delays delivery
//! - `Clock` - Time source queried by both ends of every channel
//! - `Actor` / `TickRate` - What fixed-rate schedulers drive
//!
//! Nothing here is serialized to bytes: messages are passed as owned values,
//! and a `WorldState` is a deep copy of the server's state.

mod actor;
mod channel;
mod entity;
mod error;
mod identity;
mod msg;
pub mod time;

pub use actor::{Actor, TickRate, MAX_PERIOD};
pub use channel::{LaggedChannel, QueuedMessage};
pub use entity::Entity;
pub use error::{Error, Result};
pub use identity::EntityId;
pub use msg::{Input, WorldState};
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
