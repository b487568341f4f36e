use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::clock::Clock;

/// How long a preview link stays valid, in seconds.
pub const DEFAULT_PREVIEW_TTL_SECS: i64 = 15 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PreviewEntry {
    page_id: Uuid,
    expires_at: DateTime<Utc>,
}

/// A freshly minted preview token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub page_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Process-local map of preview token to page, with a fixed lifetime per
/// token. Nothing is persisted; a restart invalidates every outstanding
/// link.
#[derive(Clone)]
pub struct PreviewTokenCache {
    entries: Arc<Mutex<HashMap<String, PreviewEntry>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl PreviewTokenCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, PreviewEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mint a new token for `page_id`. Existing tokens for the page are left
    /// alone; tokens are never reused or extended.
    pub fn issue(&self, page_id: Uuid) -> IssuedToken {
        // Two v4 UUIDs give 244 random bits.
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let expires_at = self.clock.now() + self.ttl;
        self.entries().insert(
            token.clone(),
            PreviewEntry {
                page_id,
                expires_at,
            },
        );
        tracing::debug!(%page_id, %expires_at, "issued preview token");
        IssuedToken {
            token,
            page_id,
            expires_at,
        }
    }

    /// Page the token grants access to, if it exists and has not expired.
    pub fn resolve(&self, token: &str) -> Option<Uuid> {
        let now = self.clock.now();
        self.entries()
            .get(token)
            .filter(|entry| now < entry.expires_at)
            .map(|entry| entry.page_id)
    }

    /// Drop every expired entry and return how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
