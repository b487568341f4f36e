use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use sitecraft_core::blocks::BlockDefinition;

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/blocks", get(list_blocks).post(create_block))
        .route("/blocks/{key}", get(get_block).delete(delete_block))
}

#[derive(Debug, Default, Deserialize)]
struct BlockQuery {
    search: Option<String>,
    #[serde(default)]
    grouped: bool,
}

async fn list_blocks(
    _user: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<BlockQuery>,
) -> Response {
    let search = query.search.as_deref();
    if query.grouped {
        Json(state.pages().grouped_blocks(search).await).into_response()
    } else {
        Json(state.pages().list_blocks(search).await).into_response()
    }
}

async fn get_block(
    _user: AdminUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<BlockDefinition>> {
    Ok(Json(state.pages().get_block(&key).await?))
}

async fn create_block(
    _user: AdminUser,
    State(state): State<AppState>,
    ApiJson(def): ApiJson<BlockDefinition>,
) -> ApiResult<(StatusCode, Json<BlockDefinition>)> {
    let created = state.pages().create_block(def).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_block(
    _user: AdminUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<StatusCode> {
    state.pages().delete_block(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}
