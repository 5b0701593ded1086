//! Error types for kinetune
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for kinetune
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Playlist catalog errors
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Track lookup failures
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    /// Audio transport rejected a load or play request
    #[error("Transport error: {0}")]
    Transport(String),

    /// Operation not valid in the current player state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Motion control requested but the sensor is unavailable
    #[error("Motion sensor not available")]
    MotionUnavailable,

    /// Motion control requested without sensor permission
    #[error("Motion sensor permission not granted")]
    PermissionDenied,

    /// Coordinator task is no longer running
    #[error("Player shut down")]
    ChannelClosed,

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid request parameters
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the kinetune Error
pub type Result<T> = std::result::Result<T, Error>;
