//! Error types for lagsim-core

use crate::EntityId;
use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid tick rate: {0} (must be finite, > 0, and at most one tick per day)")]
    InvalidTickRate(f64),

    #[error("Client already connected as {0}")]
    AlreadyConnected(EntityId),

    #[error("Entity not found: {0}")]
    UnknownEntity(EntityId),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
