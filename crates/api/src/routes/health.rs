use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/ping", get(ping))
}

/// Full health check. Round-trips to the database when there is one.
async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state
        .store()
        .ping()
        .await
        .map_err(|e| ApiError::Internal(format!("storage health check failed: {e}")))?;

    Ok(Json(json!({
        "status": "ok",
        "storage": state.store().backend_name(),
        "listeners": state.event_bus().listener_count(),
        "previewTokens": state.pages().previews().len(),
    })))
}

/// Lightweight ping, no storage check.
async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
