//! HTTP client for a running playground server.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::llm::{ChatBackend, ChatError, ChatReply, ChatRequest};
use crate::response::ErrorBody;

/// Sends chat requests to `POST {base_url}/api/chat`.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    /// Post a chat request.
    ///
    /// Error responses come back as the matching [`ChatError`] variant. A
    /// transport failure is reported as [`ChatError::Provider`].
    pub async fn send_chat(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        let url = self.chat_url();
        debug!(%url, provider = %request.provider, "Posting chat request");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "Failed to get response".to_string());
            return Err(ChatError::from_status(status.as_u16(), message));
        }

        response
            .json::<ChatReply>()
            .await
            .map_err(|e| ChatError::provider(e.to_string()))
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn send_chat(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        ChatClient::send_chat(self, request).await
    }
}
