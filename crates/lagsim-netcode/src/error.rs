//! Error types for lagsim-netcode

use lagsim_core::EntityId;
use thiserror::Error;

/// Why the server refused an input
///
/// Rejections are logged and dropped; the sending client is never told.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Rejection {
    /// Held longer than the server believes one client tick can last
    #[error("press duration {press_duration}s exceeds limit of {limit}s")]
    PressTooLong { press_duration: f64, limit: f64 },

    /// NaN or infinite press duration
    #[error("press duration is not finite")]
    NotFinite,

    /// Input targets an entity the server never created
    #[error("no such entity {0}")]
    UnknownEntity(EntityId),
}

/// Netcode error type
#[derive(Debug, Error)]
pub enum Error {
    /// Input dropped by server validation
    #[error("Input {sequence_number} rejected: {reason}")]
    InputRejected {
        sequence_number: u64,
        reason: Rejection,
    },

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] lagsim_core::Error),
}

/// Result type for netcode operations
pub type Result<T> = std::result::Result<T, Error>;
