//! Common error types for Revu

use thiserror::Error;

/// Common result type for Revu operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the shared config layer and by review storage
#[derive(Error, Debug)]
pub enum Error {
    /// Review storage query failed
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Config file unreadable, malformed, or a setting out of range
    #[error("Configuration error: {0}")]
    Config(String),
}
