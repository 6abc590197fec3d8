//! Error types for lagsim-hub

use thiserror::Error;

/// Result type for lagsim-hub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lagsim-hub
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is not valid RON for this schema
    #[error("failed to parse config: {0}")]
    Config(#[from] ron::error::SpannedError),

    /// Configuration parsed but is unusable
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// No client with this name
    #[error("client {0:?} not found")]
    ClientNotFound(String),

    /// The driver task is gone
    #[error("tick driver for {0} has stopped")]
    DriverStopped(String),

    /// Driver task panicked or was cancelled
    #[error("tick driver task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Netcode error
    #[error("netcode error: {0}")]
    Netcode(#[from] lagsim_netcode::Error),

    /// Core error
    #[error("core error: {0}")]
    Core(#[from] lagsim_core::Error),
}

// Compile-time check that Error is Send + Sync for thread-safe error propagation.
fn _assert_error_send_sync<T: Send + Sync>() {}
fn _error_is_send_sync() {
    _assert_error_send_sync::<Error>();
}
