//! Error types for Serene.

use thiserror::Error;

/// Common error type for Serene.
#[derive(Error, Debug)]
pub enum SereneError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Stress detection subprocess error.
    #[error("stress detection error: {0}")]
    Stress(String),

    /// Text generation provider error.
    #[error("assistant error: {0}")]
    Assistant(String),
}

impl From<sqlx::Error> for SereneError {
    fn from(e: sqlx::Error) -> Self {
        SereneError::Database(e.to_string())
    }
}

/// Result type alias for Serene operations.
pub type Result<T> = std::result::Result<T, SereneError>;
