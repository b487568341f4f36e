use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use sitecraft_core::page::{NewTemplate, PageTemplate};

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/templates", get(list_templates).post(create_template))
}

async fn list_templates(
    _user: AdminUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PageTemplate>>> {
    Ok(Json(state.pages().list_templates().await?))
}

async fn create_template(
    _user: AdminUser,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewTemplate>,
) -> ApiResult<(StatusCode, Json<PageTemplate>)> {
    let template = state.pages().create_template(input).await?;
    Ok((StatusCode::CREATED, Json(template)))
}
