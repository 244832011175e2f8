//! Request handlers

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, ErrorReport};
use crate::generation::{GenerateRequest, GenerateResponse};
use crate::AppState;

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// `POST /api/generate`
///
/// The body is parsed by hand so that malformed JSON short-circuits into the
/// fixed 400 before anything else runs. A `null` body counts as an empty
/// request; fields of the wrong type are malformed.
pub async fn generate(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request = match serde_json::from_slice::<Option<GenerateRequest>>(&body) {
        Ok(request) => request.unwrap_or_default(),
        Err(_) => return AppError::InvalidJson.into_response(),
    };

    match state.generator.generate(request).await {
        Ok(data_url) => {
            info!(size = data_url.len(), "Generation succeeded");
            Json(GenerateResponse { ok: true, data_url }).into_response()
        }
        Err(error) => {
            let expose_details = !state.settings.is_production();
            ErrorReport::new(error, expose_details).into_response()
        }
    }
}
