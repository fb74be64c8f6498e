//! LLM error types.

use thiserror::Error;

/// Errors that can occur when calling a provider API.
#[derive(Debug, Error)]
pub enum LLMError {
    /// HTTP request failed
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned an error response
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded
    #[error("unexpected response format: {0}")]
    ResponseFormat(String),

    /// The configured base URL cannot carry an API path
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}

/// Failures reported by the chat adapter to its caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    /// The caller supplied insufficient or invalid parameters. No call was made.
    #[error("{0}")]
    InvalidRequest(String),

    /// The provider is recognized but has no client yet.
    #[error("{0}")]
    NotImplemented(String),

    /// The provider call failed.
    #[error("{0}")]
    Provider(String),
}

impl ChatError {
    const FALLBACK_MESSAGE: &'static str = "Failed to process chat request";

    /// Build a provider error, substituting a generic message for an empty one.
    pub fn provider(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            ChatError::Provider(Self::FALLBACK_MESSAGE.to_string())
        } else {
            ChatError::Provider(message)
        }
    }

    /// HTTP status used at the `/api/chat` boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            ChatError::InvalidRequest(_) => 400,
            ChatError::NotImplemented(_) => 501,
            ChatError::Provider(_) => 500,
        }
    }

    /// Rebuild an error from a `/api/chat` error response.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            400 => ChatError::InvalidRequest(message.into()),
            501 => ChatError::NotImplemented(message.into()),
            _ => ChatError::provider(message),
        }
    }
}

impl From<LLMError> for ChatError {
    fn from(err: LLMError) -> Self {
        ChatError::provider(err.to_string())
    }
}
