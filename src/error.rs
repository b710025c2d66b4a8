//! Error types for the page relay

use thiserror::Error;

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while starting or serving the relay
///
/// Per-event failures (missing credentials, responder or delivery faults)
/// are not errors; they are reported through the outcome types in
/// [`crate::db`], [`crate::responder`] and [`crate::channels`].
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Credential store error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Credential store did not answer in time
    #[error("database timeout after {0:?}")]
    DatabaseTimeout(std::time::Duration),

    /// External service answered with an error status
    #[error("upstream error: {0}")]
    Upstream(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
