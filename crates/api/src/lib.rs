pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sitecraft_core::blocks::BlockRegistry;
use sitecraft_core::clock::{Clock, SystemClock};
use sitecraft_core::events::EventBus;
use sitecraft_core::store::{MemoryStore, PgStore, Store};
use sitecraft_core::PageService;
use sqlx::postgres::PgPoolOptions;
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::state::AppState;

/// Router plus the middleware stack.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config().body_limit_bytes;
    // Applied innermost-first: Router::layer boxes the body between layers.
    routes::build_router(state)
        .layer(middleware::body_limit_layer(body_limit))
        .layer(middleware::cors::cors_layer())
        .layer(middleware::request_tracing::trace_layer())
}

/// Connect to PostgreSQL and apply migrations, or fall back to the
/// in-memory store when no database is configured.
pub async fn connect_store(config: &AppConfig) -> anyhow::Result<Store> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; pages are kept in memory and lost on restart");
        return Ok(Store::Memory(MemoryStore::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect(url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {e}"))?;
    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
    tracing::info!("Database migrations applied");

    Ok(Store::Postgres(PgStore::new(pool)))
}

/// Build the page service over `store` and load persisted custom blocks.
pub async fn build_state(
    store: Store,
    config: AppConfig,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<AppState> {
    let pages = PageService::new(
        store,
        BlockRegistry::with_system_blocks(),
        clock,
        EventBus::new(config.event_bus_capacity),
        config.service_config(),
    );
    let loaded = pages
        .load_custom_blocks()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load custom blocks: {e}"))?;
    tracing::info!(loaded, "Block registry ready");
    Ok(AppState::new(pages, config))
}

/// Shorthand for the production wiring with the system clock.
pub async fn build_default_state(store: Store, config: AppConfig) -> anyhow::Result<AppState> {
    build_state(store, config, Arc::new(SystemClock)).await
}

/// Periodically drop expired preview tokens. Expiry is enforced on every
/// lookup; the sweep only bounds memory.
pub fn spawn_preview_sweeper(state: AppState, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let removed = state.pages().sweep_previews();
            if removed > 0 {
                tracing::debug!(removed, "swept expired preview tokens");
            }
        }
    })
}
