use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::blocks::{BlockCategory, BlockDefinition, BlockRegistry};
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::events::{EventBus, PageEvent, PageEventKind};
use crate::page::model::default_page_type;
use crate::page::validate::copy_slug;
use crate::page::{
    FieldError, NewPage, NewRevision, NewTemplate, PageDocument, PageFilter, PagePatch, PageStatus,
    PageTemplate, StatusTransition,
};
use crate::preview::{PreviewTokenCache, DEFAULT_PREVIEW_TTL_SECS};
use crate::resolver::{self, ResolvedPage};
use crate::revision::{self, Revision, AUTO_PUBLISH_MESSAGE, DEFAULT_RETENTION};
use crate::store::PageRepository;
use crate::warnings;

/// Attempts at finding a free `-copy-N` slug before giving up.
const MAX_COPY_SUFFIX: usize = 50;

#[derive(Debug, Clone, Copy)]
pub struct ServiceConfig {
    pub revision_retention: usize,
    pub preview_ttl: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            revision_retention: DEFAULT_RETENTION,
            preview_ttl: Duration::seconds(DEFAULT_PREVIEW_TTL_SECS),
        }
    }
}

/// Answer to a preview-link request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewLink {
    pub token: String,
    pub slug: String,
    /// Seconds until the token stops resolving.
    pub expires_in: i64,
}

/// Page builder operations over a repository.
pub struct PageService<R> {
    repo: R,
    registry: RwLock<BlockRegistry>,
    previews: PreviewTokenCache,
    clock: Arc<dyn Clock>,
    events: EventBus,
    retention: usize,
}

fn page_not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("page {id} not found"))
}

fn revision_not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("revision {id} not found"))
}

impl<R: PageRepository> PageService<R> {
    pub fn new(
        repo: R,
        registry: BlockRegistry,
        clock: Arc<dyn Clock>,
        events: EventBus,
        config: ServiceConfig,
    ) -> Self {
        Self {
            previews: PreviewTokenCache::new(config.preview_ttl, clock.clone()),
            repo,
            registry: RwLock::new(registry),
            clock,
            events,
            retention: config.revision_retention.max(1),
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn previews(&self) -> &PreviewTokenCache {
        &self.previews
    }

    fn emit(&self, kind: PageEventKind, page: &PageDocument, revision_id: Option<Uuid>, actor: Option<&str>) {
        self.events.notify(PageEvent {
            kind,
            page_id: page.id,
            slug: page.slug.clone(),
            revision_id,
            actor: actor.map(str::to_string),
            timestamp: self.clock.now(),
        });
    }

    // --- block registry -------------------------------------------------

    /// Merge persisted custom definitions into the registry. Run at startup.
    pub async fn load_custom_blocks(&self) -> ServiceResult<usize> {
        let defs = self.repo.list_block_definitions().await?;
        let mut registry = self.registry.write().await;
        let loaded = defs.into_iter().filter(|def| registry.load_custom(def.clone())).count();
        Ok(loaded)
    }

    pub async fn list_blocks(&self, search: Option<&str>) -> Vec<BlockDefinition> {
        self.registry.read().await.list(search)
    }

    pub async fn grouped_blocks(&self, search: Option<&str>) -> Vec<BlockCategory> {
        self.registry.read().await.grouped(search)
    }

    pub async fn get_block(&self, key: &str) -> ServiceResult<BlockDefinition> {
        self.registry
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("block type `{key}` not found")))
    }

    pub async fn create_block(&self, def: BlockDefinition) -> ServiceResult<BlockDefinition> {
        if def.name.trim().is_empty() {
            return Err(ServiceError::Validation(vec![FieldError::new("name", "name is required")]));
        }
        let mut registry = self.registry.write().await;
        let created = registry.create(def)?.clone();
        if let Err(err) = self.repo.insert_block_definition(created.clone()).await {
            let _ = registry.remove(&created.key);
            return Err(err.into());
        }
        tracing::info!(key = %created.key, "created block definition");
        Ok(created)
    }

    pub async fn delete_block(&self, key: &str) -> ServiceResult<()> {
        let mut registry = self.registry.write().await;
        let removed = registry.remove(key)?;
        if let Err(err) = self.repo.delete_block_definition(key).await {
            registry.load_custom(removed);
            return Err(err.into());
        }
        tracing::info!(key, "deleted block definition");
        Ok(())
    }

    // --- pages ----------------------------------------------------------

    pub async fn create_page(&self, input: NewPage, actor: Option<&str>) -> ServiceResult<PageDocument> {
        input.validate().map_err(ServiceError::Validation)?;

        let blocks = match (input.blocks, input.template_id) {
            (Some(blocks), _) => blocks,
            (None, Some(template_id)) => self
                .repo
                .get_template(template_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::Validation(vec![FieldError::new("templateId", "template not found")])
                })?
                .instantiate_blocks(),
            (None, None) => Vec::new(),
        };

        let now = self.clock.now();
        let status = input.status.unwrap_or_default();
        let page = PageDocument {
            id: Uuid::new_v4(),
            slug: input.slug,
            title: input.title,
            description: input.description.unwrap_or_default(),
            page_type: input.page_type.unwrap_or_else(default_page_type),
            status,
            blocks,
            seo: input.seo.unwrap_or_default(),
            template_id: input.template_id,
            created_at: now,
            updated_at: now,
            published_at: status.is_published().then_some(now),
        };

        let page = self.repo.insert_page(page).await?;
        tracing::info!(page_id = %page.id, slug = %page.slug, status = %page.status, "created page");
        self.emit(PageEventKind::Created, &page, None, actor);
        Ok(page)
    }

    pub async fn get_page(&self, id: Uuid) -> ServiceResult<PageDocument> {
        self.repo.get_page(id).await?.ok_or_else(|| page_not_found(id))
    }

    pub async fn get_page_by_slug(&self, slug: &str) -> ServiceResult<PageDocument> {
        self.repo
            .get_page_by_slug(slug)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("page `{slug}` not found")))
    }

    pub async fn list_pages(&self, filter: &PageFilter) -> ServiceResult<Vec<PageDocument>> {
        Ok(self.repo.list_pages(filter).await?)
    }

    /// Partial update. Publishing a draft also records the last draft state
    /// as a revision; the page and that revision are written atomically.
    pub async fn update_page(
        &self,
        id: Uuid,
        patch: PagePatch,
        actor: Option<&str>,
    ) -> ServiceResult<PageDocument> {
        patch.validate().map_err(ServiceError::Validation)?;

        let current = self.get_page(id).await?;
        let now = self.clock.now();
        let mut next = current.clone();
        let transition = patch.apply(&mut next, now);

        let saved = match transition {
            StatusTransition::Published => {
                let revision = Revision::capture(
                    &current,
                    Some(AUTO_PUBLISH_MESSAGE.to_string()),
                    actor.map(str::to_string),
                    now,
                );
                let pruned = self.repo.publish_page(next.clone(), revision, self.retention).await?;
                if pruned > 0 {
                    tracing::debug!(page_id = %id, pruned, "pruned old revisions");
                }
                next
            }
            StatusTransition::Unpublished | StatusTransition::Unchanged => {
                self.repo.update_page(next).await?
            }
        };

        let kind = match transition {
            StatusTransition::Published => {
                tracing::info!(page_id = %id, slug = %saved.slug, "published page");
                PageEventKind::Published
            }
            StatusTransition::Unpublished => {
                tracing::info!(page_id = %id, slug = %saved.slug, "unpublished page");
                PageEventKind::Unpublished
            }
            StatusTransition::Unchanged => {
                tracing::info!(page_id = %id, slug = %saved.slug, "updated page");
                PageEventKind::Updated
            }
        };
        self.emit(kind, &saved, None, actor);
        Ok(saved)
    }

    /// Delete a page together with its revisions.
    pub async fn delete_page(&self, id: Uuid, actor: Option<&str>) -> ServiceResult<()> {
        let page = self.get_page(id).await?;
        if !self.repo.delete_page(id).await? {
            return Err(page_not_found(id));
        }
        tracing::info!(page_id = %id, slug = %page.slug, "deleted page");
        self.emit(PageEventKind::Deleted, &page, None, actor);
        Ok(())
    }

    /// Copy a page as a new draft under the first free `<slug>-copy[-N]`.
    pub async fn duplicate_page(&self, id: Uuid, actor: Option<&str>) -> ServiceResult<PageDocument> {
        let source = self.get_page(id).await?;
        let slug = self.free_copy_slug(&source.slug).await?;
        let now = self.clock.now();
        let copy = PageDocument {
            id: Uuid::new_v4(),
            slug,
            title: format!("{} (copy)", source.title),
            status: PageStatus::Draft,
            blocks: source.blocks.iter().map(|b| b.with_fresh_id()).collect(),
            created_at: now,
            updated_at: now,
            published_at: None,
            ..source
        };
        let copy = self.repo.insert_page(copy).await?;
        tracing::info!(source = %id, page_id = %copy.id, slug = %copy.slug, "duplicated page");
        self.emit(PageEventKind::Created, &copy, None, actor);
        Ok(copy)
    }

    async fn free_copy_slug(&self, base: &str) -> ServiceResult<String> {
        for n in 1..=MAX_COPY_SUFFIX {
            let candidate = copy_slug(base, n);
            if self.repo.get_page_by_slug(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
        Err(ServiceError::Conflict(format!("no free copy slug for `{base}`")))
    }

    // --- validation -----------------------------------------------------

    /// Advisory warnings for an arbitrary document, e.g. unsaved editor state.
    pub async fn validate_document(&self, doc: &PageDocument) -> Vec<String> {
        let registry = self.registry.read().await;
        warnings::validate(doc, &registry)
    }

    /// Advisory warnings for the persisted page.
    pub async fn page_warnings(&self, id: Uuid) -> ServiceResult<Vec<String>> {
        let page = self.get_page(id).await?;
        Ok(self.validate_document(&page).await)
    }

    // --- revisions ------------------------------------------------------

    async fn store_revision(&self, revision: Revision) -> ServiceResult<Revision> {
        let page_id = revision.page_id;
        self.repo.insert_revision(revision.clone()).await?;
        let pruned = self.repo.prune_revisions(page_id, self.retention).await?;
        if pruned > 0 {
            tracing::debug!(%page_id, pruned, "pruned old revisions");
        }
        Ok(revision)
    }

    /// Snapshot the page as currently persisted. Edits the caller has not
    /// saved yet are not part of the revision.
    pub async fn create_revision(
        &self,
        page_id: Uuid,
        input: NewRevision,
        actor: Option<&str>,
    ) -> ServiceResult<Revision> {
        let page = self.get_page(page_id).await?;
        let created_by = actor.map(str::to_string).or(input.created_by);
        let revision = Revision::capture(&page, input.message, created_by, self.clock.now());
        let revision = self.store_revision(revision).await?;
        tracing::info!(%page_id, revision_id = %revision.id, "created revision");
        self.emit(PageEventKind::RevisionCreated, &page, Some(revision.id), actor);
        Ok(revision)
    }

    /// Revisions of a page, newest first.
    pub async fn list_revisions(&self, page_id: Uuid) -> ServiceResult<Vec<Revision>> {
        self.get_page(page_id).await?;
        Ok(self.repo.list_revisions(page_id).await?)
    }

    pub async fn get_revision(&self, page_id: Uuid, revision_id: Uuid) -> ServiceResult<Revision> {
        self.repo
            .get_revision(revision_id)
            .await?
            .filter(|rev| rev.page_id == page_id)
            .ok_or_else(|| revision_not_found(revision_id))
    }

    /// Overwrite the page's editable fields from a revision. The pre-restore
    /// state is not saved automatically; create a revision first to keep it.
    pub async fn restore_revision(
        &self,
        page_id: Uuid,
        revision_id: Uuid,
        actor: Option<&str>,
    ) -> ServiceResult<PageDocument> {
        let mut page = self.get_page(page_id).await?;
        let revision = self
            .repo
            .get_revision(revision_id)
            .await?
            .ok_or_else(|| revision_not_found(revision_id))?;
        if revision.page_id != page_id {
            return Err(ServiceError::Conflict(format!(
                "revision {revision_id} does not belong to page {page_id}"
            )));
        }

        let now = self.clock.now();
        page.apply_snapshot(&revision.snapshot);
        page.updated_at = now;
        if page.status.is_published() && page.published_at.is_none() {
            page.published_at = Some(now);
        }
        let saved = self.repo.update_page(page).await?;
        tracing::info!(%page_id, %revision_id, "restored revision");
        self.emit(PageEventKind::RevisionRestored, &saved, Some(revision_id), actor);
        Ok(saved)
    }

    /// Unified diff from a revision to the current page.
    pub async fn revision_diff(&self, page_id: Uuid, revision_id: Uuid) -> ServiceResult<String> {
        let page = self.get_page(page_id).await?;
        let revision = self.get_revision(page_id, revision_id).await?;
        Ok(revision::diff(&revision, &page)?)
    }

    // --- preview --------------------------------------------------------

    pub async fn issue_preview(&self, page_id: Uuid) -> ServiceResult<PreviewLink> {
        let page = self.get_page(page_id).await?;
        let issued = self.previews.issue(page.id);
        Ok(PreviewLink {
            token: issued.token,
            slug: page.slug,
            expires_in: self.previews.ttl().num_seconds(),
        })
    }

    pub async fn resolve_public(&self, slug: &str, token: Option<&str>) -> ServiceResult<Option<ResolvedPage>> {
        Ok(resolver::resolve(&self.repo, &self.previews, slug, token).await?)
    }

    pub fn sweep_previews(&self) -> usize {
        self.previews.sweep()
    }

    // --- templates ------------------------------------------------------

    pub async fn create_template(&self, input: NewTemplate) -> ServiceResult<PageTemplate> {
        input.validate().map_err(ServiceError::Validation)?;
        let template = PageTemplate {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            blocks: input.blocks,
            created_at: self.clock.now(),
        };
        let template = self.repo.insert_template(template).await?;
        tracing::info!(template_id = %template.id, name = %template.name, "created template");
        Ok(template)
    }

    pub async fn list_templates(&self) -> ServiceResult<Vec<PageTemplate>> {
        Ok(self.repo.list_templates().await?)
    }
}
