use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use sitecraft_core::page::{NewRevision, PageDocument};
use sitecraft_core::revision::Revision;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/pages/{id}/revisions",
            get(list_revisions).post(create_revision),
        )
        .route("/pages/{id}/revisions/{revision_id}", get(get_revision))
        .route("/pages/{id}/revisions/{revision_id}/diff", get(revision_diff))
        .route(
            "/pages/{id}/revisions/{revision_id}/restore",
            post(restore_revision),
        )
}

async fn list_revisions(
    _user: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Revision>>> {
    Ok(Json(state.pages().list_revisions(id).await?))
}

/// Body is optional; an empty request records an unlabelled revision.
async fn create_revision(
    user: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Revision>)> {
    let input: NewRevision = if body.iter().all(u8::is_ascii_whitespace) {
        NewRevision::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
    };
    let revision = state.pages().create_revision(id, input, user.actor()).await?;
    Ok((StatusCode::CREATED, Json(revision)))
}

async fn get_revision(
    _user: AdminUser,
    State(state): State<AppState>,
    Path((id, revision_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Revision>> {
    Ok(Json(state.pages().get_revision(id, revision_id).await?))
}

async fn revision_diff(
    _user: AdminUser,
    State(state): State<AppState>,
    Path((id, revision_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Value>> {
    let diff = state.pages().revision_diff(id, revision_id).await?;
    Ok(Json(json!({ "revisionId": revision_id, "diff": diff })))
}

async fn restore_revision(
    user: AdminUser,
    State(state): State<AppState>,
    Path((id, revision_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<PageDocument>> {
    Ok(Json(
        state
            .pages()
            .restore_revision(id, revision_id, user.actor())
            .await?,
    ))
}
