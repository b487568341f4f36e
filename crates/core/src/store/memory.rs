use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PageRepository, StoreError, StoreResult};
use crate::blocks::BlockDefinition;
use crate::page::{PageDocument, PageFilter, PageTemplate};
use crate::revision::Revision;

#[derive(Debug, Default)]
struct MemoryState {
    pages: HashMap<Uuid, PageDocument>,
    /// Per page, oldest first.
    revisions: HashMap<Uuid, Vec<Revision>>,
    blocks: BTreeMap<String, BlockDefinition>,
    templates: HashMap<Uuid, PageTemplate>,
}

impl MemoryState {
    fn slug_owner(&self, slug: &str) -> Option<Uuid> {
        self.pages.values().find(|p| p.slug == slug).map(|p| p.id)
    }
}

/// Process-local store. One lock guards everything, so each write, slug
/// check included, is atomic.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PageRepository for MemoryStore {
    async fn insert_page(&self, page: PageDocument) -> StoreResult<PageDocument> {
        let mut state = self.state.write().await;
        if state.slug_owner(&page.slug).is_some() {
            return Err(StoreError::SlugTaken(page.slug));
        }
        state.pages.insert(page.id, page.clone());
        Ok(page)
    }

    async fn get_page(&self, id: Uuid) -> StoreResult<Option<PageDocument>> {
        Ok(self.state.read().await.pages.get(&id).cloned())
    }

    async fn get_page_by_slug(&self, slug: &str) -> StoreResult<Option<PageDocument>> {
        let state = self.state.read().await;
        Ok(state.pages.values().find(|p| p.slug == slug).cloned())
    }

    async fn list_pages(&self, filter: &PageFilter) -> StoreResult<Vec<PageDocument>> {
        let state = self.state.read().await;
        let mut pages: Vec<_> = state
            .pages
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        pages.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.slug.cmp(&b.slug)));
        Ok(pages)
    }

    async fn update_page(&self, page: PageDocument) -> StoreResult<PageDocument> {
        let mut state = self.state.write().await;
        if !state.pages.contains_key(&page.id) {
            return Err(StoreError::NotFound);
        }
        if state.slug_owner(&page.slug).is_some_and(|owner| owner != page.id) {
            return Err(StoreError::SlugTaken(page.slug));
        }
        state.pages.insert(page.id, page.clone());
        Ok(page)
    }

    async fn delete_page(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        state.revisions.remove(&id);
        Ok(state.pages.remove(&id).is_some())
    }

    async fn insert_revision(&self, revision: Revision) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if !state.pages.contains_key(&revision.page_id) {
            return Err(StoreError::NotFound);
        }
        state
            .revisions
            .entry(revision.page_id)
            .or_default()
            .push(revision);
        Ok(())
    }

    async fn publish_page(&self, page: PageDocument, revision: Revision, keep: usize) -> StoreResult<usize> {
        let mut state = self.state.write().await;
        if revision.page_id != page.id || !state.pages.contains_key(&page.id) {
            return Err(StoreError::NotFound);
        }
        if state.slug_owner(&page.slug).is_some_and(|owner| owner != page.id) {
            return Err(StoreError::SlugTaken(page.slug));
        }
        let revs = state.revisions.entry(page.id).or_default();
        revs.push(revision);
        let excess = revs.len().saturating_sub(keep);
        revs.drain(..excess);
        state.pages.insert(page.id, page);
        Ok(excess)
    }

    async fn list_revisions(&self, page_id: Uuid) -> StoreResult<Vec<Revision>> {
        let state = self.state.read().await;
        Ok(state
            .revisions
            .get(&page_id)
            .map(|revs| revs.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_revision(&self, id: Uuid) -> StoreResult<Option<Revision>> {
        let state = self.state.read().await;
        Ok(state
            .revisions
            .values()
            .flatten()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn prune_revisions(&self, page_id: Uuid, keep: usize) -> StoreResult<usize> {
        let mut state = self.state.write().await;
        let Some(revs) = state.revisions.get_mut(&page_id) else {
            return Ok(0);
        };
        let excess = revs.len().saturating_sub(keep);
        revs.drain(..excess);
        Ok(excess)
    }

    async fn list_block_definitions(&self) -> StoreResult<Vec<BlockDefinition>> {
        Ok(self.state.read().await.blocks.values().cloned().collect())
    }

    async fn insert_block_definition(&self, def: BlockDefinition) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.blocks.contains_key(&def.key) {
            return Err(StoreError::DuplicateKey(def.key));
        }
        state.blocks.insert(def.key.clone(), def);
        Ok(())
    }

    async fn delete_block_definition(&self, key: &str) -> StoreResult<bool> {
        Ok(self.state.write().await.blocks.remove(key).is_some())
    }

    async fn insert_template(&self, template: PageTemplate) -> StoreResult<PageTemplate> {
        let mut state = self.state.write().await;
        state.templates.insert(template.id, template.clone());
        Ok(template)
    }

    async fn get_template(&self, id: Uuid) -> StoreResult<Option<PageTemplate>> {
        Ok(self.state.read().await.templates.get(&id).cloned())
    }

    async fn list_templates(&self) -> StoreResult<Vec<PageTemplate>> {
        let state = self.state.read().await;
        let mut templates: Vec<_> = state.templates.values().cloned().collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }
}
