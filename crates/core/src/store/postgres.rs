use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use super::{PageRepository, StoreError, StoreResult};
use crate::blocks::{BlockDefinition, BlockInstance};
use crate::page::{PageDocument, PageFilter, PageStatus, PageTemplate, PageSnapshot, SeoFields};
use crate::revision::Revision;

const PAGE_COLUMNS: &str = "id, slug, title, description, page_type, status, blocks, seo, \
                            template_id, created_at, updated_at, published_at";

/// Database row representation of a page.
#[derive(Debug, FromRow)]
struct PageRow {
    id: Uuid,
    slug: String,
    title: String,
    description: String,
    page_type: String,
    status: String,
    blocks: Json<Vec<BlockInstance>>,
    seo: Json<SeoFields>,
    template_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
}

impl TryFrom<PageRow> for PageDocument {
    type Error = StoreError;

    fn try_from(row: PageRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<PageStatus>()
            .map_err(|e| StoreError::Database(sqlx::Error::Decode(e.into())))?;
        Ok(PageDocument {
            id: row.id,
            slug: row.slug,
            title: row.title,
            description: row.description,
            page_type: row.page_type,
            status,
            blocks: row.blocks.0,
            seo: row.seo.0,
            template_id: row.template_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            published_at: row.published_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RevisionRow {
    id: Uuid,
    page_id: Uuid,
    created_at: DateTime<Utc>,
    created_by: Option<String>,
    message: Option<String>,
    snapshot: Json<PageSnapshot>,
}

impl From<RevisionRow> for Revision {
    fn from(row: RevisionRow) -> Self {
        Revision {
            id: row.id,
            page_id: row.page_id,
            created_at: row.created_at,
            created_by: row.created_by,
            message: row.message,
            snapshot: row.snapshot.0,
        }
    }
}

#[derive(Debug, FromRow)]
struct TemplateRow {
    id: Uuid,
    name: String,
    description: String,
    blocks: Json<Vec<BlockInstance>>,
    created_at: DateTime<Utc>,
}

impl From<TemplateRow> for PageTemplate {
    fn from(row: TemplateRow) -> Self {
        PageTemplate {
            id: row.id,
            name: row.name,
            description: row.description,
            blocks: row.blocks.0,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL-backed store. Slug uniqueness comes from the `pages_slug_key`
/// unique constraint; revisions cascade with their page.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn slug_conflict(err: sqlx::Error, slug: &str) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::SlugTaken(slug.to_string())
    } else {
        StoreError::Database(err)
    }
}

/// Overwrite a page row. Returns the number of rows touched.
async fn write_page(conn: &mut PgConnection, page: &PageDocument) -> StoreResult<u64> {
    let result = sqlx::query(
        "UPDATE pages SET slug = $2, title = $3, description = $4, page_type = $5, \
         status = $6, blocks = $7, seo = $8, template_id = $9, updated_at = $10, \
         published_at = $11 WHERE id = $1",
    )
    .bind(page.id)
    .bind(&page.slug)
    .bind(&page.title)
    .bind(&page.description)
    .bind(&page.page_type)
    .bind(page.status.as_str())
    .bind(Json(&page.blocks))
    .bind(Json(&page.seo))
    .bind(page.template_id)
    .bind(page.updated_at)
    .bind(page.published_at)
    .execute(conn)
    .await
    .map_err(|e| slug_conflict(e, &page.slug))?;
    Ok(result.rows_affected())
}

/// Insert a revision if its page exists. Returns the number of rows written.
async fn write_revision(conn: &mut PgConnection, revision: &Revision) -> StoreResult<u64> {
    let result = sqlx::query(
        "INSERT INTO page_revisions (id, page_id, created_at, created_by, message, snapshot) \
         SELECT $1, $2, $3, $4, $5, $6 WHERE EXISTS (SELECT 1 FROM pages WHERE id = $2)",
    )
    .bind(revision.id)
    .bind(revision.page_id)
    .bind(revision.created_at)
    .bind(&revision.created_by)
    .bind(&revision.message)
    .bind(Json(&revision.snapshot))
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

async fn prune(conn: &mut PgConnection, page_id: Uuid, keep: usize) -> StoreResult<usize> {
    let keep = i64::try_from(keep).unwrap_or(i64::MAX);
    let result = sqlx::query(
        "DELETE FROM page_revisions WHERE page_id = $1 AND id NOT IN ( \
             SELECT id FROM page_revisions WHERE page_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2)",
    )
    .bind(page_id)
    .bind(keep)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() as usize)
}

impl PageRepository for PgStore {
    async fn insert_page(&self, page: PageDocument) -> StoreResult<PageDocument> {
        let sql = format!(
            "INSERT INTO pages ({PAGE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        );
        sqlx::query(&sql)
            .bind(page.id)
            .bind(&page.slug)
            .bind(&page.title)
            .bind(&page.description)
            .bind(&page.page_type)
            .bind(page.status.as_str())
            .bind(Json(&page.blocks))
            .bind(Json(&page.seo))
            .bind(page.template_id)
            .bind(page.created_at)
            .bind(page.updated_at)
            .bind(page.published_at)
            .execute(&self.pool)
            .await
            .map_err(|e| slug_conflict(e, &page.slug))?;
        Ok(page)
    }

    async fn get_page(&self, id: Uuid) -> StoreResult<Option<PageDocument>> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE id = $1");
        sqlx::query_as::<_, PageRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(PageDocument::try_from)
            .transpose()
    }

    async fn get_page_by_slug(&self, slug: &str) -> StoreResult<Option<PageDocument>> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE slug = $1");
        sqlx::query_as::<_, PageRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .map(PageDocument::try_from)
            .transpose()
    }

    async fn list_pages(&self, filter: &PageFilter) -> StoreResult<Vec<PageDocument>> {
        let sql = format!(
            "SELECT {PAGE_COLUMNS} FROM pages \
             WHERE ($1::text IS NULL OR status = $1) \
               AND ($2::text IS NULL OR page_type = $2) \
               AND ($3::text IS NULL \
                    OR strpos(lower(title), lower($3)) > 0 \
                    OR strpos(lower(slug), lower($3)) > 0) \
             ORDER BY updated_at DESC, slug ASC"
        );
        let page_type = filter.page_type.as_deref().filter(|t| !t.is_empty());
        let search = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
        sqlx::query_as::<_, PageRow>(&sql)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(page_type)
            .bind(search)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(PageDocument::try_from)
            .collect()
    }

    async fn update_page(&self, page: PageDocument) -> StoreResult<PageDocument> {
        let mut conn = self.pool.acquire().await?;
        if write_page(&mut conn, &page).await? == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(page)
    }

    async fn delete_page(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM pages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_revision(&self, revision: Revision) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        if write_revision(&mut conn, &revision).await? == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn publish_page(&self, page: PageDocument, revision: Revision, keep: usize) -> StoreResult<usize> {
        if revision.page_id != page.id {
            return Err(StoreError::NotFound);
        }
        // Dropping `tx` on any early return rolls the whole publish back.
        let mut tx = self.pool.begin().await?;
        if write_page(&mut tx, &page).await? == 0 {
            return Err(StoreError::NotFound);
        }
        write_revision(&mut tx, &revision).await?;
        let pruned = prune(&mut tx, page.id, keep).await?;
        tx.commit().await?;
        Ok(pruned)
    }

    async fn list_revisions(&self, page_id: Uuid) -> StoreResult<Vec<Revision>> {
        let rows = sqlx::query_as::<_, RevisionRow>(
            "SELECT id, page_id, created_at, created_by, message, snapshot \
             FROM page_revisions WHERE page_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(page_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Revision::from).collect())
    }

    async fn get_revision(&self, id: Uuid) -> StoreResult<Option<Revision>> {
        let row = sqlx::query_as::<_, RevisionRow>(
            "SELECT id, page_id, created_at, created_by, message, snapshot \
             FROM page_revisions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Revision::from))
    }

    async fn prune_revisions(&self, page_id: Uuid, keep: usize) -> StoreResult<usize> {
        let mut conn = self.pool.acquire().await?;
        prune(&mut conn, page_id, keep).await
    }

    async fn list_block_definitions(&self) -> StoreResult<Vec<BlockDefinition>> {
        let rows: Vec<(Json<BlockDefinition>,)> =
            sqlx::query_as("SELECT definition FROM block_definitions ORDER BY key")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(def,)| def.0).collect())
    }

    async fn insert_block_definition(&self, def: BlockDefinition) -> StoreResult<()> {
        sqlx::query("INSERT INTO block_definitions (key, definition) VALUES ($1, $2)")
            .bind(&def.key)
            .bind(Json(&def))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::DuplicateKey(def.key.clone())
                } else {
                    StoreError::Database(e)
                }
            })?;
        Ok(())
    }

    async fn delete_block_definition(&self, key: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM block_definitions WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_template(&self, template: PageTemplate) -> StoreResult<PageTemplate> {
        sqlx::query(
            "INSERT INTO page_templates (id, name, description, blocks, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(&template.description)
        .bind(Json(&template.blocks))
        .bind(template.created_at)
        .execute(&self.pool)
        .await?;
        Ok(template)
    }

    async fn get_template(&self, id: Uuid) -> StoreResult<Option<PageTemplate>> {
        let row = sqlx::query_as::<_, TemplateRow>(
            "SELECT id, name, description, blocks, created_at FROM page_templates WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(PageTemplate::from))
    }

    async fn list_templates(&self) -> StoreResult<Vec<PageTemplate>> {
        let rows = sqlx::query_as::<_, TemplateRow>(
            "SELECT id, name, description, blocks, created_at FROM page_templates ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PageTemplate::from).collect())
    }
}

/// These run against a real database and are skipped unless `DATABASE_URL`
/// is set. Every test works on its own slugs, so they can share a database.
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::postgres::PgPoolOptions;

    async fn store() -> Option<PgStore> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping postgres test");
            return None;
        };
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("connect to DATABASE_URL");
        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .expect("apply migrations");
        Some(PgStore::new(pool))
    }

    fn page(prefix: &str) -> PageDocument {
        let now = Utc::now();
        PageDocument {
            id: Uuid::new_v4(),
            slug: format!("{prefix}-{}", Uuid::new_v4().simple()),
            title: prefix.into(),
            description: String::new(),
            page_type: "landing".into(),
            status: PageStatus::Draft,
            blocks: Vec::new(),
            seo: SeoFields::default(),
            template_id: None,
            created_at: now,
            updated_at: now,
            published_at: None,
        }
    }

    #[tokio::test]
    async fn unique_violations_become_slug_conflicts() {
        let Some(store) = store().await else { return };
        let home = store.insert_page(page("home")).await.unwrap();
        let about = store.insert_page(page("about")).await.unwrap();

        let mut clash = page("other");
        clash.slug = home.slug.clone();
        assert!(matches!(store.insert_page(clash).await, Err(StoreError::SlugTaken(_))));

        let mut renamed = about.clone();
        renamed.slug = home.slug.clone();
        assert!(matches!(store.update_page(renamed).await, Err(StoreError::SlugTaken(_))));
        let stored = store.get_page(about.id).await.unwrap().unwrap();
        assert_eq!(stored.slug, about.slug);

        store.delete_page(home.id).await.unwrap();
        store.delete_page(about.id).await.unwrap();
    }

    #[tokio::test]
    async fn prune_keeps_the_newest_revisions_newest_first() {
        let Some(store) = store().await else { return };
        let doc = store.insert_page(page("promo")).await.unwrap();
        let start = Utc::now();
        let mut ids = Vec::new();
        for i in 0..5 {
            let rev = Revision::capture(&doc, Some(format!("r{i}")), None, start + Duration::seconds(i));
            ids.push(rev.id);
            store.insert_revision(rev).await.unwrap();
        }

        assert_eq!(store.prune_revisions(doc.id, 3).await.unwrap(), 2);
        let kept: Vec<_> = store
            .list_revisions(doc.id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(kept, vec![ids[4], ids[3], ids[2]]);

        assert!(store.delete_page(doc.id).await.unwrap());
        assert!(store.list_revisions(doc.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_filters_by_status_and_search() {
        let Some(store) = store().await else { return };
        let marker = Uuid::new_v4().simple().to_string();
        let mut draft = page("filter");
        draft.title = format!("Draft {marker}");
        let mut live = page("filter");
        live.title = format!("Live {marker}");
        live.status = PageStatus::Published;
        live.published_at = Some(live.updated_at);
        store.insert_page(draft.clone()).await.unwrap();
        store.insert_page(live.clone()).await.unwrap();

        let filter = PageFilter {
            status: Some(PageStatus::Published),
            search: Some(marker.to_uppercase()),
            ..PageFilter::default()
        };
        let found = store.list_pages(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, live.id);

        store.delete_page(draft.id).await.unwrap();
        store.delete_page(live.id).await.unwrap();
    }

    #[tokio::test]
    async fn rejected_publish_rolls_back() {
        let Some(store) = store().await else { return };
        let taken = store.insert_page(page("taken")).await.unwrap();
        let draft = store.insert_page(page("promo")).await.unwrap();

        let mut live = draft.clone();
        live.status = PageStatus::Published;
        live.slug = taken.slug.clone();
        let rev = Revision::capture(&draft, None, None, Utc::now());
        assert!(matches!(
            store.publish_page(live, rev, 50).await,
            Err(StoreError::SlugTaken(_))
        ));
        let stored = store.get_page(draft.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PageStatus::Draft);
        assert!(store.list_revisions(draft.id).await.unwrap().is_empty());

        let mut live = draft.clone();
        live.status = PageStatus::Published;
        let rev = Revision::capture(&draft, None, None, Utc::now());
        assert_eq!(store.publish_page(live, rev.clone(), 50).await.unwrap(), 0);
        let stored = store.get_page(draft.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PageStatus::Published);
        assert_eq!(store.list_revisions(draft.id).await.unwrap()[0].id, rev.id);

        store.delete_page(taken.id).await.unwrap();
        store.delete_page(draft.id).await.unwrap();
    }
}
