use axum::extract::State;
use axum::http::StatusCode;

use crate::server::AppState;

/// GET /livez
pub async fn livez() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// GET /readyz: ready once at least one provider has a client.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.chat.has_clients() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "no provider clients registered")
    }
}
