//! LLM provider trait.

use async_trait::async_trait;
use serde_json::Value;

use super::error::LLMError;
use super::types::GenerateRequest;

/// A native client for one provider's API.
///
/// Implementations translate the conversation into the provider's wire format
/// and return the raw response body. Shape normalization happens in the
/// adapter, so a client never needs to know which fields the caller reads.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Make one generation call with the caller's API key.
    async fn generate(&self, api_key: &str, request: GenerateRequest) -> Result<Value, LLMError>;
}
