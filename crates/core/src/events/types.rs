use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events emitted after successful page mutations, consumed by the admin
/// websocket listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SiteEvent {
    Welcome,
    Page(PageEvent),
    Reconnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageEventKind {
    Created,
    Updated,
    Published,
    Unpublished,
    Deleted,
    RevisionCreated,
    RevisionRestored,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEvent {
    pub kind: PageEventKind,
    pub page_id: Uuid,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    pub timestamp: DateTime<Utc>,
}
