//! Common error types for PolicyPilot

use thiserror::Error;

/// Common result type for PolicyPilot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across PolicyPilot crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found, or outside the caller's org
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Valid request against an invalid state (archived campaign, empty
    /// campaign, no members)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Per-actor throttle tripped; carries a caller-facing retry hint
    #[error("Rate limited: retry in {retry_after_ms} ms")]
    RateLimited { retry_after_ms: u64 },

    /// Object storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
