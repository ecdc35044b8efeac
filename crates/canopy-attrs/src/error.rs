//! Error types for attribute operations.

use thiserror::Error;

/// Errors that can occur during attribute operations.
#[derive(Debug, Error)]
pub enum AttrError {
    /// The binding was already closed.
    #[error("attribute set closed: {path}")]
    Closed { path: String },

    /// The attribute key is not acceptable.
    #[error("invalid attribute key: {0:?}")]
    InvalidKey(String),

    /// Internal state of the store can no longer be trusted.
    #[error("attribute store lock poisoned: {0}")]
    Poisoned(String),
}

/// Convenience type alias for attribute operations.
pub type AttrResult<T> = std::result::Result<T, AttrError>;
