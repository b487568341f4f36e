use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use sitecraft_core::blocks::BlockInstance;
use sitecraft_core::page::{
    default_page_type, NewPage, PageDocument, PageFilter, PagePatch, PageStatus, SeoFields,
};
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pages", get(list_pages).post(create_page))
        .route("/pages/validate", post(validate_document))
        .route(
            "/pages/{id}",
            get(get_page).patch(update_page).delete(delete_page),
        )
        .route("/pages/{id}/duplicate", post(duplicate_page))
        .route("/pages/{id}/warnings", get(page_warnings))
}

async fn list_pages(
    _user: AdminUser,
    State(state): State<AppState>,
    Query(filter): Query<PageFilter>,
) -> ApiResult<Json<Vec<PageDocument>>> {
    Ok(Json(state.pages().list_pages(&filter).await?))
}

async fn create_page(
    user: AdminUser,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewPage>,
) -> ApiResult<(StatusCode, Json<PageDocument>)> {
    let page = state.pages().create_page(input, user.actor()).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

async fn get_page(
    _user: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PageDocument>> {
    Ok(Json(state.pages().get_page(id).await?))
}

async fn update_page(
    user: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(patch): ApiJson<PagePatch>,
) -> ApiResult<Json<PageDocument>> {
    Ok(Json(state.pages().update_page(id, patch, user.actor()).await?))
}

async fn delete_page(
    user: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.pages().delete_page(id, user.actor()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn duplicate_page(
    user: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<PageDocument>)> {
    let copy = state.pages().duplicate_page(id, user.actor()).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

async fn page_warnings(
    _user: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let warnings = state.pages().page_warnings(id).await?;
    Ok(Json(json!({ "warnings": warnings })))
}

/// Editor-side document that has not necessarily been saved yet.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftDocument {
    #[serde(default)]
    title: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    page_type: Option<String>,
    #[serde(default)]
    blocks: Vec<BlockInstance>,
    #[serde(default)]
    seo: SeoFields,
}

async fn validate_document(
    _user: AdminUser,
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<DraftDocument>,
) -> Json<Value> {
    let now = Utc::now();
    let doc = PageDocument {
        id: Uuid::nil(),
        slug: draft.slug,
        title: draft.title,
        description: String::new(),
        page_type: draft.page_type.unwrap_or_else(default_page_type),
        status: PageStatus::Draft,
        blocks: draft.blocks,
        seo: draft.seo,
        template_id: None,
        created_at: now,
        updated_at: now,
        published_at: None,
    };
    let warnings = state.pages().validate_document(&doc).await;
    Json(json!({ "warnings": warnings }))
}
