//! Gemini provider using the native `generateContent` API.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;

use super::error::LLMError;
use super::provider::LLMProvider;
use super::types::{GenerateRequest, Role};

/// Gemini provider with native API format.
pub struct GeminiProvider {
    client: Client,
    base_url: String,
}

impl GeminiProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com";

    #[must_use]
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// `{base_url}/v1beta/models/{model}:generateContent`. The model id is
    /// pushed as one escaped segment, so it can never leave `models/`.
    fn endpoint(&self, model: &str) -> Result<Url, LLMError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| LLMError::InvalidBaseUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| LLMError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["v1beta", "models"])
            .push(&format!("{model}:generateContent"));
        Ok(url)
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn generate(&self, api_key: &str, request: GenerateRequest) -> Result<Value, LLMError> {
        let url = self.endpoint(&request.model)?;
        let body = to_request(&request);

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(LLMError::Api {
                status,
                message: api_error_message(&text),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| LLMError::ResponseFormat(e.to_string()))
    }
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Request {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
}

#[derive(serde::Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(serde::Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(serde::Serialize)]
struct Part {
    text: String,
}

fn to_request(request: &GenerateRequest) -> Request {
    let contents = request
        .messages
        .iter()
        .map(|msg| Content {
            role: match msg.role {
                Role::User => "user",
                Role::Assistant => "model",
            },
            parts: vec![Part {
                text: msg.content.clone(),
            }],
        })
        .collect();

    let system_instruction = request
        .system_prompt
        .as_ref()
        .filter(|p| !p.is_empty())
        .map(|p| SystemInstruction {
            parts: vec![Part { text: p.clone() }],
        });

    Request {
        contents,
        system_instruction,
    }
}

/// Pull `error.message` out of a Gemini error body, falling back to the raw text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")?
                .get("message")?
                .as_str()
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}
