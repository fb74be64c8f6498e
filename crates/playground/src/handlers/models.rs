use axum::Json;
use axum::extract::Query;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::models::{all_models, models_for};
use crate::provider::Provider;
use crate::response;

#[derive(Deserialize)]
pub struct ModelsQuery {
    provider: Option<String>,
}

/// GET /api/models[?provider=...]
pub async fn list_models(Query(query): Query<ModelsQuery>) -> Response {
    let Some(name) = query.provider else {
        return Json(all_models()).into_response();
    };
    match name.parse::<Provider>() {
        Ok(provider) => Json(models_for(provider)).into_response(),
        Err(e) => response::bad_request(e.to_string()).into_response(),
    }
}
