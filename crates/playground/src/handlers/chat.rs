//! Chat completion handler.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

use crate::llm::{ChatError, ChatRequest};
use crate::response;
use crate::server::AppState;

/// POST /api/chat
///
/// Request body: `{"provider", "model", "apiKey", "messages", "systemPrompt"}`.
///
/// Responses:
/// - `200 {"content", "usage"}`
/// - `400 {"error"}` for a missing API key or model, an invalid provider or a malformed body
/// - `501 {"error"}` for providers without a client
/// - `500 {"error"}` when the provider call fails
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejecting malformed chat request");
            return response::bad_request(rejection.body_text()).into_response();
        }
    };

    let provider = request.provider.clone();
    let model = request.model.clone();

    match state.chat.send_chat(request).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => {
            if let ChatError::Provider(message) = &e {
                error!(%provider, %model, error = %message, "Chat API error");
            }
            response::from_chat_error(&e).into_response()
        }
    }
}
