//! Error types for rilwire.

use thiserror::Error;

/// Main error type for all channel operations.
#[derive(Debug, Error)]
pub enum RilwireError {
    /// Declared frame length exceeds the configured maximum.
    ///
    /// Treated as protocol corruption (a garbled length prefix would
    /// otherwise drive unbounded buffer growth) and closes the channel.
    #[error("frame length {length} exceeds maximum {max}")]
    FrameTooLarge {
        /// Length declared by the prefix.
        length: u32,
        /// Configured maximum frame size.
        max: u32,
    },

    /// Blocking read on the transport failed.
    #[error("transport read error: {0}")]
    Read(#[source] std::io::Error),

    /// Blocking write on the transport failed.
    #[error("transport write error: {0}")]
    Write(#[source] std::io::Error),

    /// The peer closed the channel, or the channel is no longer running.
    #[error("channel closed")]
    ConnectionClosed,

    /// Worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// `start()` called on a worker that already left the `Created` state.
    #[error("worker already started")]
    AlreadyStarted,

    /// Operation not valid in the worker's current state.
    #[error("invalid worker state: {0}")]
    InvalidState(&'static str),
}

/// Result type alias using RilwireError.
pub type Result<T> = std::result::Result<T, RilwireError>;
