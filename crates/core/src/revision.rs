use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use similar::TextDiff;
use uuid::Uuid;

use crate::page::{PageDocument, PageSnapshot};

/// Message attached to the revision captured when a draft is published.
pub const AUTO_PUBLISH_MESSAGE: &str = "Auto-snapshot before publish";

/// Revisions kept per page unless configured otherwise.
pub const DEFAULT_RETENTION: usize = 50;

/// Immutable copy of a page's editable fields at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub id: Uuid,
    pub page_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub snapshot: PageSnapshot,
}

impl Revision {
    /// Capture `doc` as it is now. Ids are v7 so they sort by creation time.
    pub fn capture(
        doc: &PageDocument,
        message: Option<String>,
        created_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            page_id: doc.id,
            created_at: now,
            created_by,
            message: message.filter(|m| !m.trim().is_empty()),
            snapshot: doc.snapshot(),
        }
    }
}

/// Unified diff from the revision snapshot to the page's current editable
/// fields, both rendered as pretty JSON.
pub fn diff(revision: &Revision, current: &PageDocument) -> Result<String, serde_json::Error> {
    let old = serde_json::to_string_pretty(&revision.snapshot)?;
    let new = serde_json::to_string_pretty(&current.snapshot())?;
    Ok(TextDiff::from_lines(&old, &new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("revision {}", revision.id), "current")
        .to_string())
}
