//! Error types for session storage operations

/// Errors from session storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("store parse error: {0}")]
    Parse(String),

    #[error("serialization error: {0}")]
    Serialize(String),
}

/// Result alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;
