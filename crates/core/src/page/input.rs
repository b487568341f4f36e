use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::model::{PageDocument, PageStatus, SeoFields};
use super::validate::{check_blocks, check_page_type, check_slug, check_title, FieldError, FieldErrors};
use crate::blocks::BlockInstance;

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Body of a page create request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPage {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub page_type: Option<String>,
    #[serde(default)]
    pub template_id: Option<Uuid>,
    #[serde(default)]
    pub blocks: Option<Vec<BlockInstance>>,
    #[serde(default)]
    pub seo: Option<SeoFields>,
    #[serde(default)]
    pub status: Option<PageStatus>,
}

impl NewPage {
    pub fn new(title: &str, slug: &str) -> Self {
        Self {
            title: title.to_string(),
            slug: slug.to_string(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        check_title(&self.title, &mut errors);
        check_slug(&self.slug, &mut errors);
        if let Some(page_type) = &self.page_type {
            check_page_type(page_type, &mut errors);
        }
        if let Some(blocks) = &self.blocks {
            check_blocks(blocks, &mut errors);
        }
        errors.into_result()
    }
}

/// Partial page update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub page_type: Option<String>,
    pub status: Option<PageStatus>,
    pub blocks: Option<Vec<BlockInstance>>,
    pub seo: Option<SeoFields>,
    #[serde(default, deserialize_with = "double_option")]
    pub template_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub published_at: Option<Option<DateTime<Utc>>>,
}

/// What applying a patch did to the page's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    Unchanged,
    Published,
    Unpublished,
}

impl PagePatch {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        if let Some(title) = &self.title {
            check_title(title, &mut errors);
        }
        if let Some(slug) = &self.slug {
            check_slug(slug, &mut errors);
        }
        if let Some(page_type) = &self.page_type {
            check_page_type(page_type, &mut errors);
        }
        if let Some(blocks) = &self.blocks {
            check_blocks(blocks, &mut errors);
        }
        errors.into_result()
    }

    /// Apply onto `doc`, refreshing `updated_at`. A move into `published`
    /// stamps `published_at` with `now` unless the patch supplies one.
    pub fn apply(self, doc: &mut PageDocument, now: DateTime<Utc>) -> StatusTransition {
        let was_published = doc.status.is_published();

        if let Some(title) = self.title {
            doc.title = title;
        }
        if let Some(slug) = self.slug {
            doc.slug = slug;
        }
        if let Some(description) = self.description {
            doc.description = description;
        }
        if let Some(page_type) = self.page_type {
            doc.page_type = page_type;
        }
        if let Some(status) = self.status {
            doc.status = status;
        }
        if let Some(blocks) = self.blocks {
            doc.blocks = blocks;
        }
        if let Some(seo) = self.seo {
            doc.seo = seo;
        }
        if let Some(template_id) = self.template_id {
            doc.template_id = template_id;
        }

        let transition = match (was_published, doc.status.is_published()) {
            (false, true) => StatusTransition::Published,
            (true, false) => StatusTransition::Unpublished,
            _ => StatusTransition::Unchanged,
        };

        match self.published_at {
            Some(explicit) => doc.published_at = explicit,
            None if transition == StatusTransition::Published => doc.published_at = Some(now),
            None => {}
        }
        doc.updated_at = now;
        transition
    }
}

/// Filters for listing pages.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFilter {
    pub status: Option<PageStatus>,
    pub page_type: Option<String>,
    pub search: Option<String>,
}

impl PageFilter {
    pub fn matches(&self, doc: &PageDocument) -> bool {
        if self.status.is_some_and(|s| s != doc.status) {
            return false;
        }
        if let Some(page_type) = self.page_type.as_deref().filter(|t| !t.is_empty()) {
            if doc.page_type != page_type {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(needle) => {
                let needle = needle.to_lowercase();
                doc.title.to_lowercase().contains(&needle) || doc.slug.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

/// Body of a manual "save revision" request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRevision {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub blocks: Vec<BlockInstance>,
}

impl NewTemplate {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        if self.name.trim().is_empty() {
            errors.push("name", "name is required");
        }
        check_blocks(&self.blocks, &mut errors);
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn draft(now: DateTime<Utc>) -> PageDocument {
        PageDocument {
            id: Uuid::new_v4(),
            slug: "spring-promo".into(),
            title: "Spring Promo".into(),
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

    #[test]
    fn publishing_stamps_published_at() {
        let start = Utc::now();
        let mut doc = draft(start);
        let later = start + Duration::minutes(5);
        let patch: PagePatch = serde_json::from_value(json!({ "status": "published" })).unwrap();
        assert_eq!(patch.apply(&mut doc, later), StatusTransition::Published);
        assert_eq!(doc.published_at, Some(later));
        assert_eq!(doc.updated_at, later);
    }

    #[test]
    fn explicit_published_at_wins() {
        let start = Utc::now();
        let mut doc = draft(start);
        let chosen = start - Duration::days(3);
        let patch: PagePatch =
            serde_json::from_value(json!({ "status": "published", "publishedAt": chosen })).unwrap();
        patch.apply(&mut doc, start);
        assert_eq!(doc.published_at, Some(chosen));
    }

    #[test]
    fn null_template_id_clears_it() {
        let now = Utc::now();
        let mut doc = draft(now);
        doc.template_id = Some(Uuid::new_v4());

        let untouched: PagePatch = serde_json::from_value(json!({ "title": "New" })).unwrap();
        untouched.apply(&mut doc, now);
        assert!(doc.template_id.is_some());

        let cleared: PagePatch = serde_json::from_value(json!({ "templateId": null })).unwrap();
        cleared.apply(&mut doc, now);
        assert!(doc.template_id.is_none());
    }

    #[test]
    fn republishing_is_not_a_transition() {
        let now = Utc::now();
        let mut doc = draft(now);
        doc.status = PageStatus::Published;
        doc.published_at = Some(now);
        let patch: PagePatch = serde_json::from_value(json!({ "status": "published" })).unwrap();
        assert_eq!(patch.apply(&mut doc, now + Duration::hours(1)), StatusTransition::Unchanged);
        assert_eq!(doc.published_at, Some(now));
    }

    #[test]
    fn filter_search_is_case_insensitive_over_title_and_slug() {
        let doc = draft(Utc::now());
        let by_title = PageFilter {
            search: Some("SPRING".into()),
            ..Default::default()
        };
        let by_slug = PageFilter {
            search: Some("promo".into()),
            ..Default::default()
        };
        let wrong_status = PageFilter {
            status: Some(PageStatus::Published),
            ..Default::default()
        };
        assert!(by_title.matches(&doc));
        assert!(by_slug.matches(&doc));
        assert!(!wrong_status.matches(&doc));
    }

    #[test]
    fn new_page_validation_reports_fields() {
        let errors = NewPage::new("", "Not A Slug").validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(NewPage::new("Spring Promo", "spring-promo").validate().is_ok());
    }
}
