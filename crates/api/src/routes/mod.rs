pub mod blocks;
pub mod health;
pub mod listen;
pub mod pages;
pub mod preview;
pub mod public;
pub mod revisions;
pub mod templates;

use axum::Router;

use crate::state::AppState;

/// Assemble the full router with all route groups. Everything under
/// `/v1/admin` requires a builder role.
pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .merge(pages::routes())
        .merge(revisions::routes())
        .merge(preview::routes())
        .merge(blocks::routes())
        .merge(templates::routes())
        .merge(listen::routes());

    Router::new()
        .merge(health::routes())
        .merge(public::routes())
        .nest("/v1/admin", admin)
        .with_state(state)
}
