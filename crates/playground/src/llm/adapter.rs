//! The chat adapter: validation, dispatch and normalization.

use async_trait::async_trait;
use tracing::debug;

use super::error::ChatError;
use super::normalize::normalize;
use super::registry::ProviderRegistry;
use super::types::{ChatReply, ChatRequest, GenerateRequest};
use crate::provider::ProviderTag;

/// Anything that can answer a [`ChatRequest`].
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_chat(&self, request: ChatRequest) -> Result<ChatReply, ChatError>;
}

/// Turns a provider-agnostic request into one provider call.
///
/// Holds no per-request state, so concurrent calls are independent.
#[derive(Clone, Default)]
pub struct ChatAdapter {
    registry: ProviderRegistry,
}

impl ChatAdapter {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    /// Whether any provider has a client to dispatch to.
    pub fn has_clients(&self) -> bool {
        !self.registry.is_empty()
    }

    /// Validate, dispatch and normalize a chat request.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for a missing API key or model, or an unknown provider.
    /// - `NotImplemented` for a known provider without a client.
    /// - `Provider` when the remote call fails.
    ///
    /// Only the last one involves any network traffic.
    pub async fn send_chat(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        if request.api_key.is_empty() {
            return Err(ChatError::InvalidRequest("API key is required".to_string()));
        }
        if request.model.is_empty() {
            return Err(ChatError::InvalidRequest("Model is required".to_string()));
        }

        let provider = match ProviderTag::parse(&request.provider) {
            ProviderTag::Known(provider) => provider,
            ProviderTag::Unknown(name) => {
                debug!(provider = %name, "Rejecting unknown provider");
                return Err(ChatError::InvalidRequest("Invalid provider".to_string()));
            }
        };

        let Some(client) = self.registry.get(provider) else {
            return Err(ChatError::NotImplemented(format!(
                "{provider} integration coming soon"
            )));
        };

        let generate = GenerateRequest {
            model: request.model,
            messages: request.messages,
            system_prompt: request.system_prompt.filter(|p| !p.is_empty()),
        };

        debug!(
            %provider,
            model = %generate.model,
            messages = generate.messages.len(),
            "Dispatching chat request"
        );

        let raw = client.generate(&request.api_key, generate).await?;
        Ok(normalize(&raw))
    }
}

#[async_trait]
impl ChatBackend for ChatAdapter {
    async fn send_chat(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        ChatAdapter::send_chat(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::{Value, json};

    use super::*;
    use crate::llm::{GeminiProvider, LLMError, LLMProvider, Message, Role, TokenUsage};
    use crate::provider::Provider;

    enum Failure {
        Status(u16),
        Malformed,
    }

    /// Records every call and answers with a canned result.
    struct StubProvider {
        reply: Result<Value, Failure>,
        calls: Mutex<Vec<(String, GenerateRequest)>>,
    }

    impl StubProvider {
        fn ok(reply: Value) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing(failure: Failure) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(failure),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LLMProvider for StubProvider {
        async fn generate(
            &self,
            api_key: &str,
            request: GenerateRequest,
        ) -> Result<Value, LLMError> {
            self.calls
                .lock()
                .unwrap()
                .push((api_key.to_string(), request));
            match &self.reply {
                Ok(value) => Ok(value.clone()),
                Err(Failure::Status(status)) => Err(LLMError::Api {
                    status: *status,
                    message: "quota exhausted".to_string(),
                }),
                Err(Failure::Malformed) => Err(LLMError::ResponseFormat(
                    "expected value at line 1 column 1".to_string(),
                )),
            }
        }
    }

    fn adapter_with(stub: Arc<StubProvider>) -> ChatAdapter {
        let mut registry = ProviderRegistry::new();
        registry.register(Provider::Gemini, stub);
        ChatAdapter::new(registry)
    }

    fn request(provider: &str, model: &str, api_key: &str) -> ChatRequest {
        ChatRequest {
            provider: provider.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            messages: vec![Message::user("Hi")],
            system_prompt: None,
        }
    }

    #[tokio::test]
    async fn missing_api_key_is_invalid_without_call() {
        let stub = StubProvider::ok(json!("unused"));
        let adapter = adapter_with(stub.clone());

        let err = adapter
            .send_chat(request("gemini", "gemini-2.5-flash", ""))
            .await
            .unwrap_err();
        assert_eq!(err, ChatError::InvalidRequest("API key is required".to_string()));
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn missing_model_is_invalid_without_call() {
        let stub = StubProvider::ok(json!("unused"));
        let adapter = adapter_with(stub.clone());

        let err = adapter
            .send_chat(request("gemini", "", "x"))
            .await
            .unwrap_err();
        assert_eq!(err, ChatError::InvalidRequest("Model is required".to_string()));
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn placeholder_providers_are_not_implemented() {
        let adapter = adapter_with(StubProvider::ok(json!("unused")));

        let err = adapter
            .send_chat(request("gpt", "gpt-4", "x"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ChatError::NotImplemented("gpt integration coming soon".to_string())
        );

        let err = adapter
            .send_chat(request("claude", "claude-3-opus", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotImplemented(_)));
    }

    #[tokio::test]
    async fn unknown_provider_is_invalid() {
        let adapter = adapter_with(StubProvider::ok(json!("unused")));
        let err = adapter
            .send_chat(request("mistral", "m", "x"))
            .await
            .unwrap_err();
        assert_eq!(err, ChatError::InvalidRequest("Invalid provider".to_string()));
    }

    #[tokio::test]
    async fn successful_call_is_normalized() {
        let stub = StubProvider::ok(json!({
            "candidates": [{"content": {"parts": [{"text": "hi"}]}}],
            "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 1, "totalTokenCount": 4}
        }));
        let adapter = adapter_with(stub.clone());

        let mut req = request("gemini", "gemini-2.5-flash", "key-1");
        req.messages.push(Message::assistant("Hello"));
        req.messages.push(Message::user("Again"));
        req.system_prompt = Some("Be brief".to_string());

        let reply = adapter.send_chat(req).await.unwrap();
        assert_eq!(reply.content, "hi");
        assert_eq!(
            reply.usage,
            TokenUsage {
                prompt_token_count: 3,
                candidates_token_count: 1,
                total_token_count: 4,
            }
        );

        let calls = stub.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (api_key, sent) = &calls[0];
        assert_eq!(api_key, "key-1");
        assert_eq!(sent.model, "gemini-2.5-flash");
        let roles: Vec<Role> = sent.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(sent.system_prompt.as_deref(), Some("Be brief"));
    }

    #[tokio::test]
    async fn empty_system_prompt_is_dropped() {
        let stub = StubProvider::ok(json!({"text": "ok"}));
        let adapter = adapter_with(stub.clone());

        let mut req = request("gemini", "gemini-pro", "x");
        req.system_prompt = Some(String::new());
        adapter.send_chat(req).await.unwrap();

        assert!(stub.calls.lock().unwrap()[0].1.system_prompt.is_none());
    }

    #[tokio::test]
    async fn empty_message_history_is_allowed() {
        let adapter = adapter_with(StubProvider::ok(json!({})));
        let mut req = request("gemini", "gemini-pro", "x");
        req.messages.clear();

        let reply = adapter.send_chat(req).await.unwrap();
        assert_eq!(reply.content, "");
        assert_eq!(reply.usage, TokenUsage::default());
    }

    #[tokio::test]
    async fn provider_failure_becomes_provider_error() {
        let adapter = adapter_with(StubProvider::failing(Failure::Status(429)));
        let err = adapter
            .send_chat(request("gemini", "gemini-pro", "x"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ChatError::Provider("api error (status 429): quota exhausted".to_string())
        );
    }

    #[tokio::test]
    async fn undecodable_response_becomes_provider_error() {
        let adapter = adapter_with(StubProvider::failing(Failure::Malformed));
        let err = adapter
            .send_chat(request("gemini", "gemini-pro", "x"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ChatError::Provider(
                "unexpected response format: expected value at line 1 column 1".to_string()
            )
        );
    }

    #[tokio::test]
    async fn transport_failure_becomes_provider_error() {
        // Nothing listens on the discard port.
        let gemini = GeminiProvider::new(reqwest::Client::new(), "http://127.0.0.1:9".to_string());
        let mut registry = ProviderRegistry::new();
        registry.register(Provider::Gemini, Arc::new(gemini));
        let adapter = ChatAdapter::new(registry);

        let err = adapter
            .send_chat(request("gemini", "gemini-pro", "x"))
            .await
            .unwrap_err();
        match err {
            ChatError::Provider(message) => assert!(message.starts_with("http request failed")),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unregistered_gemini_is_not_implemented() {
        let adapter = ChatAdapter::new(ProviderRegistry::new());
        let err = adapter
            .send_chat(request("gemini", "gemini-pro", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotImplemented(_)));
    }
}
