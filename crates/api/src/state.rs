use std::sync::Arc;

use sitecraft_core::events::EventBus;
use sitecraft_core::store::Store;
use sitecraft_core::PageService;

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    pages: PageService<Store>,
    config: AppConfig,
}

impl AppState {
    pub fn new(pages: PageService<Store>, config: AppConfig) -> Self {
        Self {
            inner: Arc::new(InnerState { pages, config }),
        }
    }

    pub fn pages(&self) -> &PageService<Store> {
        &self.inner.pages
    }

    pub fn store(&self) -> &Store {
        self.inner.pages.repo()
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn event_bus(&self) -> &EventBus {
        self.inner.pages.events()
    }
}
