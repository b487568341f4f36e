use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const X_ROBOTS_TAG: HeaderName = HeaderName::from_static("x-robots-tag");

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/public/pages/{*slug}", get(resolve_page))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicQuery {
    preview_token: Option<String>,
}

/// Published pages for everyone; drafts only with a live preview token for
/// that page. Every other case is the same 404.
async fn resolve_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PublicQuery>,
) -> ApiResult<Response> {
    let token = query.preview_token.as_deref().filter(|t| !t.is_empty());
    let resolved = state
        .pages()
        .resolve_public(&slug, token)
        .await?
        .ok_or_else(|| ApiError::NotFound("page not found".to_string()))?;

    let is_preview = resolved.is_preview;
    let mut response = Json(resolved).into_response();
    if is_preview {
        let headers = response.headers_mut();
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        headers.insert(X_ROBOTS_TAG, HeaderValue::from_static("noindex"));
    }
    Ok(response)
}
