//! A caller-side conversation over the credential store and a chat backend.
//!
//! The session resolves the selected key and system prompt for its provider,
//! keeps the running history and token totals, and renders failures as
//! assistant messages so the conversation always shows what happened.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::credentials::CredentialStore;
use crate::llm::{ChatBackend, ChatRequest, Message, TokenUsage};
use crate::provider::Provider;

/// Reasons a message was not sent. Nothing is appended to the history.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Please set an API key first")]
    MissingApiKey,

    #[error("Please select a model")]
    MissingModel,
}

pub struct ChatSession {
    provider: Provider,
    model: Option<String>,
    messages: Vec<Message>,
    usage: TokenUsage,
    store: CredentialStore,
    backend: Arc<dyn ChatBackend>,
}

impl ChatSession {
    pub fn new(
        provider: Provider,
        model: Option<String>,
        store: CredentialStore,
        backend: Arc<dyn ChatBackend>,
    ) -> Self {
        Self {
            provider,
            model,
            messages: Vec::new(),
            usage: TokenUsage::default(),
            store,
            backend,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn set_model(&mut self, model: Option<String>) {
        self.model = model.filter(|m| !m.trim().is_empty());
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Token totals since the session started or was last cleared.
    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn has_api_key(&self) -> bool {
        self.store.get_key(self.provider, None).is_some()
    }

    /// Send a user message with the full history and return the reply.
    ///
    /// Backend failures do not return an error: they are appended as an
    /// assistant message starting with `Error:` and leave the totals alone.
    pub async fn send_message(
        &mut self,
        content: impl Into<String>,
    ) -> Result<&Message, SessionError> {
        let selected = self.store.get_selected_key_id(self.provider);
        let Some(api_key) = self.store.get_key(self.provider, selected.as_deref()) else {
            return Err(SessionError::MissingApiKey);
        };
        let Some(model) = self.model.clone() else {
            return Err(SessionError::MissingModel);
        };

        self.messages.push(Message::user(content));

        let system_prompt = self.store.get_system_prompt(self.provider);
        let request = ChatRequest {
            provider: self.provider.to_string(),
            model,
            api_key,
            messages: self.messages.clone(),
            system_prompt: (!system_prompt.is_empty()).then_some(system_prompt),
        };

        let reply = match self.backend.send_chat(request).await {
            Ok(reply) => {
                self.usage += reply.usage;
                Message::assistant(reply.content)
            }
            Err(e) => {
                warn!(provider = %self.provider, error = %e, "Chat request failed");
                Message::assistant(format!("Error: {e}"))
            }
        };

        let index = self.messages.len();
        self.messages.push(reply);
        Ok(&self.messages[index])
    }

    /// Drop the history and reset the token totals.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.usage = TokenUsage::default();
    }
}
