use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::blocks::BlockInstance;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    #[default]
    Draft,
    Published,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageStatus::Draft => "draft",
            PageStatus::Published => "published",
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, PageStatus::Published)
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PageStatus::Draft),
            "published" => Ok(PageStatus::Published),
            other => Err(format!("unknown page status `{other}`")),
        }
    }
}

/// Page-level SEO fields. Everything is optional; the advisory validator
/// reports what is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    /// JSON-LD structured data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_index: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sitemap_priority: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sitemap_changefreq: Option<String>,
}

/// A builder page: metadata plus an ordered block list. Block order is
/// render order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDocument {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_page_type")]
    pub page_type: String,
    #[serde(default)]
    pub status: PageStatus,
    #[serde(default)]
    pub blocks: Vec<BlockInstance>,
    #[serde(default)]
    pub seo: SeoFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

pub fn default_page_type() -> String {
    "landing".to_string()
}

impl PageDocument {
    /// Copy of the editable fields, as stored in a revision.
    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            title: self.title.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            status: self.status,
            blocks: self.blocks.clone(),
            seo: self.seo.clone(),
            page_type: self.page_type.clone(),
            template_id: self.template_id,
        }
    }

    /// Overwrite the editable fields from a snapshot. Identity and
    /// timestamps are left to the caller.
    pub fn apply_snapshot(&mut self, snapshot: &PageSnapshot) {
        self.title = snapshot.title.clone();
        self.slug = snapshot.slug.clone();
        self.description = snapshot.description.clone();
        self.status = snapshot.status;
        self.blocks = snapshot.blocks.clone();
        self.seo = snapshot.seo.clone();
        self.page_type = snapshot.page_type.clone();
        self.template_id = snapshot.template_id;
    }

    pub fn block(&self, id: Uuid) -> Option<&BlockInstance> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Copy suitable for public rendering: hidden blocks removed.
    pub fn public_view(&self) -> PageDocument {
        let mut doc = self.clone();
        doc.blocks.retain(|b| !b.is_hidden());
        doc
    }
}

/// Editable fields of a page captured by a revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub status: PageStatus,
    #[serde(default)]
    pub blocks: Vec<BlockInstance>,
    #[serde(default)]
    pub seo: SeoFields,
    #[serde(default = "default_page_type")]
    pub page_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Uuid>,
}

/// Reusable starting block layout for new pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTemplate {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub blocks: Vec<BlockInstance>,
    pub created_at: DateTime<Utc>,
}

impl PageTemplate {
    /// Template blocks with fresh instance ids, ready to place on a page.
    pub fn instantiate_blocks(&self) -> Vec<BlockInstance> {
        self.blocks.iter().map(BlockInstance::with_fresh_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_round_trips_as_lowercase_text() {
        assert_eq!(serde_json::to_value(PageStatus::Published).unwrap(), json!("published"));
        assert_eq!("draft".parse::<PageStatus>().unwrap(), PageStatus::Draft);
        assert!("archived".parse::<PageStatus>().is_err());
    }

    #[test]
    fn seo_serializes_camel_case_and_skips_missing() {
        let seo = SeoFields {
            meta_description: Some("desc".into()),
            og_image: Some("/og.jpg".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&seo).unwrap(),
            json!({ "metaDescription": "desc", "ogImage": "/og.jpg" })
        );
    }

    #[test]
    fn public_view_drops_hidden_blocks() {
        let now = Utc::now();
        let doc: PageDocument = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "slug": "services",
            "title": "Services",
            "blocks": [
                { "id": Uuid::new_v4(), "type": "hero", "props": {} },
                { "id": Uuid::new_v4(), "type": "faq", "props": {}, "meta": { "hidden": true } }
            ],
            "createdAt": now,
            "updatedAt": now
        }))
        .unwrap();
        assert_eq!(doc.page_type, "landing");
        let public = doc.public_view();
        assert_eq!(public.blocks.len(), 1);
        assert_eq!(public.blocks[0].block_type, "hero");
    }
}
