//! Persistence for pages, revisions, custom block definitions and templates.
//!
//! Every write is a single whole-record operation. Slug uniqueness is
//! enforced here, inside the same critical section (memory) or constraint
//! (PostgreSQL) as the write itself. There is no optimistic concurrency: the
//! last committed update of a page wins.

pub mod memory;
pub mod postgres;

use std::future::Future;

use thiserror::Error;
use uuid::Uuid;

use crate::blocks::BlockDefinition;
use crate::page::{PageDocument, PageFilter, PageTemplate};
use crate::revision::Revision;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("slug `{0}` is already in use")]
    SlugTaken(String),
    #[error("key `{0}` already exists")]
    DuplicateKey(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait PageRepository: Send + Sync {
    /// Insert a new page. Fails with [`StoreError::SlugTaken`] on collision.
    fn insert_page(&self, page: PageDocument) -> impl Future<Output = StoreResult<PageDocument>> + Send;

    fn get_page(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<PageDocument>>> + Send;

    fn get_page_by_slug(&self, slug: &str) -> impl Future<Output = StoreResult<Option<PageDocument>>> + Send;

    /// Pages matching `filter`, most recently updated first.
    fn list_pages(&self, filter: &PageFilter) -> impl Future<Output = StoreResult<Vec<PageDocument>>> + Send;

    /// Replace the stored page with the same id. The slug must not belong to
    /// any other page.
    fn update_page(&self, page: PageDocument) -> impl Future<Output = StoreResult<PageDocument>> + Send;

    /// Remove a page and all of its revisions. `false` if it did not exist.
    fn delete_page(&self, id: Uuid) -> impl Future<Output = StoreResult<bool>> + Send;

    fn insert_revision(&self, revision: Revision) -> impl Future<Output = StoreResult<()>> + Send;

    /// Replace the page and record `revision` for it in one atomic write,
    /// then prune the page's revisions to `keep`. On failure neither the
    /// page nor the revision history changes. Returns how many revisions
    /// were pruned.
    fn publish_page(
        &self,
        page: PageDocument,
        revision: Revision,
        keep: usize,
    ) -> impl Future<Output = StoreResult<usize>> + Send;

    /// Revisions of a page, newest first.
    fn list_revisions(&self, page_id: Uuid) -> impl Future<Output = StoreResult<Vec<Revision>>> + Send;

    fn get_revision(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<Revision>>> + Send;

    /// Delete the oldest revisions of a page beyond `keep`. Returns how many
    /// were removed.
    fn prune_revisions(&self, page_id: Uuid, keep: usize) -> impl Future<Output = StoreResult<usize>> + Send;

    fn list_block_definitions(&self) -> impl Future<Output = StoreResult<Vec<BlockDefinition>>> + Send;

    fn insert_block_definition(&self, def: BlockDefinition) -> impl Future<Output = StoreResult<()>> + Send;

    fn delete_block_definition(&self, key: &str) -> impl Future<Output = StoreResult<bool>> + Send;

    fn insert_template(&self, template: PageTemplate) -> impl Future<Output = StoreResult<PageTemplate>> + Send;

    fn get_template(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<PageTemplate>>> + Send;

    fn list_templates(&self) -> impl Future<Output = StoreResult<Vec<PageTemplate>>> + Send;
}

/// Backend chosen at startup.
#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Postgres(PgStore),
}

impl Store {
    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Postgres(_) => "postgres",
        }
    }

    /// Round-trip to the backing database, if there is one.
    pub async fn ping(&self) -> StoreResult<()> {
        match self {
            Store::Memory(_) => Ok(()),
            Store::Postgres(pg) => pg.ping().await,
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            Store::Memory($store) => $call.await,
            Store::Postgres($store) => $call.await,
        }
    };
}

impl PageRepository for Store {
    async fn insert_page(&self, page: PageDocument) -> StoreResult<PageDocument> {
        dispatch!(self, s => s.insert_page(page))
    }

    async fn get_page(&self, id: Uuid) -> StoreResult<Option<PageDocument>> {
        dispatch!(self, s => s.get_page(id))
    }

    async fn get_page_by_slug(&self, slug: &str) -> StoreResult<Option<PageDocument>> {
        dispatch!(self, s => s.get_page_by_slug(slug))
    }

    async fn list_pages(&self, filter: &PageFilter) -> StoreResult<Vec<PageDocument>> {
        dispatch!(self, s => s.list_pages(filter))
    }

    async fn update_page(&self, page: PageDocument) -> StoreResult<PageDocument> {
        dispatch!(self, s => s.update_page(page))
    }

    async fn delete_page(&self, id: Uuid) -> StoreResult<bool> {
        dispatch!(self, s => s.delete_page(id))
    }

    async fn insert_revision(&self, revision: Revision) -> StoreResult<()> {
        dispatch!(self, s => s.insert_revision(revision))
    }

    async fn publish_page(&self, page: PageDocument, revision: Revision, keep: usize) -> StoreResult<usize> {
        dispatch!(self, s => s.publish_page(page, revision, keep))
    }

    async fn list_revisions(&self, page_id: Uuid) -> StoreResult<Vec<Revision>> {
        dispatch!(self, s => s.list_revisions(page_id))
    }

    async fn get_revision(&self, id: Uuid) -> StoreResult<Option<Revision>> {
        dispatch!(self, s => s.get_revision(id))
    }

    async fn prune_revisions(&self, page_id: Uuid, keep: usize) -> StoreResult<usize> {
        dispatch!(self, s => s.prune_revisions(page_id, keep))
    }

    async fn list_block_definitions(&self) -> StoreResult<Vec<BlockDefinition>> {
        dispatch!(self, s => s.list_block_definitions())
    }

    async fn insert_block_definition(&self, def: BlockDefinition) -> StoreResult<()> {
        dispatch!(self, s => s.insert_block_definition(def))
    }

    async fn delete_block_definition(&self, key: &str) -> StoreResult<bool> {
        dispatch!(self, s => s.delete_block_definition(key))
    }

    async fn insert_template(&self, template: PageTemplate) -> StoreResult<PageTemplate> {
        dispatch!(self, s => s.insert_template(template))
    }

    async fn get_template(&self, id: Uuid) -> StoreResult<Option<PageTemplate>> {
        dispatch!(self, s => s.get_template(id))
    }

    async fn list_templates(&self) -> StoreResult<Vec<PageTemplate>> {
        dispatch!(self, s => s.list_templates())
    }
}
