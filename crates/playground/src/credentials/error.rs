//! Storage error types.

use thiserror::Error;

/// Errors raised by a [`super::SessionStorage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No storage medium exists in this execution context.
    #[error("session storage is unavailable")]
    Unavailable,

    /// The backend failed while reading or writing.
    #[error("session storage backend error: {0}")]
    Backend(String),
}
