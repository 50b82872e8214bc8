//! Error types for feedloop-engine
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. Per-stream failures (source, policy, delivery) never
//! abort sibling streams; the taxonomy keeps them distinguishable.

use thiserror::Error;

/// Main error type for the playback engine
#[derive(Error, Debug)]
pub enum Error {
    /// Source file could not be opened or read (fatal to one stream only)
    #[error("Source unavailable: {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },

    /// Playback policy rejected before any row is read
    #[error("Invalid playback policy for stream {stream_id}: {reason}")]
    InvalidPolicy { stream_id: String, reason: String },

    /// Message bus publish failure (non-fatal, playback continues)
    #[error("Delivery error on channel {channel}: {reason}")]
    Delivery { channel: String, reason: String },

    /// Session lifecycle errors (duplicate start, unknown project)
    #[error("Session error: {0}")]
    Session(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the engine Error
pub type Result<T> = std::result::Result<T, Error>;
