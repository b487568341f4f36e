//! Public page resolution. The only path from the builder to anything
//! public-facing.

use serde::Serialize;

use crate::page::PageDocument;
use crate::preview::PreviewTokenCache;
use crate::store::{PageRepository, StoreResult};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPage {
    pub document: PageDocument,
    pub is_preview: bool,
}

/// Published pages resolve for everyone, token or not. A draft resolves
/// only with a live preview token issued for that exact page. Anything else
/// is `None`, so a hidden draft looks exactly like a missing slug.
pub async fn resolve<R: PageRepository>(
    repo: &R,
    previews: &PreviewTokenCache,
    slug: &str,
    token: Option<&str>,
) -> StoreResult<Option<ResolvedPage>> {
    let Some(doc) = repo.get_page_by_slug(slug).await? else {
        return Ok(None);
    };

    if doc.status.is_published() {
        return Ok(Some(ResolvedPage {
            document: doc.public_view(),
            is_preview: false,
        }));
    }

    let granted = token
        .filter(|t| !t.is_empty())
        .and_then(|t| previews.resolve(t))
        .is_some_and(|page_id| page_id == doc.id);
    if !granted {
        tracing::debug!(slug, "draft requested without a valid preview token");
        return Ok(None);
    }

    Ok(Some(ResolvedPage {
        document: doc.public_view(),
        is_preview: true,
    }))
}
