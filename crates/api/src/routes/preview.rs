use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use sitecraft_core::PreviewLink;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/pages/{id}/preview-token", post(issue_preview))
}

async fn issue_preview(
    user: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PreviewLink>> {
    let link = state.pages().issue_preview(id).await?;
    tracing::info!(page_id = %id, sub = %user.subject, expires_in = link.expires_in, "issued preview token");
    Ok(Json(link))
}
