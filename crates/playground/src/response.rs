//! JSON error responses for HTTP handlers.

use axum::Json;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::llm::ChatError;

/// Body of every non-2xx response: `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type ErrorResponse = (StatusCode, Json<ErrorBody>);

pub fn error(status: StatusCode, message: impl Into<String>) -> ErrorResponse {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

pub fn bad_request(message: impl Into<String>) -> ErrorResponse {
    error(StatusCode::BAD_REQUEST, message)
}

pub fn from_chat_error(err: &ChatError) -> ErrorResponse {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error(status, err.to_string())
}
