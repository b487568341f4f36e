//! Client-side page editing session.
//!
//! Holds a mutable working copy of a page and the snapshot it was last saved
//! as. Dirtiness is structural equality of the editable fields against that
//! snapshot, so undoing an edit by hand makes the session clean again.
//!
//! ```text
//! Clean --edit--> Dirty --begin_save--> Saving --ok--> Clean (or Dirty if edited meanwhile)
//!                   ^                      |
//!                   +-------failed---------+
//! ```

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::blocks::{BlockInstance, BlockMeta, BlockRegistry};
use crate::page::{PageDocument, PageSnapshot, PageStatus, SeoFields};
use crate::warnings;

/// `(block type, field)` pairs that may be edited directly on the canvas.
/// Everything else goes through the schema-driven property panel.
pub const INLINE_EDITABLE: &[(&str, &str)] = &[
    ("hero", "headline"),
    ("hero", "subheadline"),
    ("cta_band", "heading"),
    ("cta_band", "buttonText"),
    ("rich_text", "content"),
];

pub fn is_inline_editable(block_type: &str, field: &str) -> bool {
    INLINE_EDITABLE
        .iter()
        .any(|(t, f)| *t == block_type && *f == field)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Clean,
    Dirty,
    Saving,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("unknown block type `{0}`")]
    UnknownBlockType(String),
    #[error("block {0} is not on this page")]
    BlockNotFound(Uuid),
    #[error("index {index} is out of range for {len} blocks")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("`{block_type}.{field}` cannot be edited inline")]
    NotInlineEditable { block_type: String, field: String },
    #[error("there are no unsaved changes")]
    NothingToSave,
    #[error("a save is already in flight")]
    SaveInFlight,
    #[error("no save is in flight")]
    NotSaving,
}

#[derive(Debug, Clone)]
pub struct EditingSession {
    doc: PageDocument,
    saved: PageSnapshot,
    state: SessionState,
    last_error: Option<String>,
}

impl EditingSession {
    /// Start editing a freshly loaded page.
    pub fn new(doc: PageDocument) -> Self {
        let saved = doc.snapshot();
        Self {
            doc,
            saved,
            state: SessionState::Clean,
            last_error: None,
        }
    }

    /// Replace the working copy with a page loaded from the server, e.g.
    /// after opening another page or restoring a revision. Local edits are
    /// discarded.
    pub fn load(&mut self, doc: PageDocument) {
        *self = Self::new(doc);
    }

    pub fn document(&self) -> &PageDocument {
        &self.doc
    }

    pub fn blocks(&self) -> &[BlockInstance] {
        &self.doc.blocks
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.doc.snapshot() != self.saved
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Advisory warnings for the current working copy.
    pub fn warnings(&self, registry: &BlockRegistry) -> Vec<String> {
        warnings::validate(&self.doc, registry)
    }

    fn touched(&mut self) {
        if self.state != SessionState::Saving {
            self.state = if self.is_dirty() {
                SessionState::Dirty
            } else {
                SessionState::Clean
            };
        }
    }

    fn index_of(&self, id: Uuid) -> Result<usize, SessionError> {
        self.doc
            .blocks
            .iter()
            .position(|b| b.id == id)
            .ok_or(SessionError::BlockNotFound(id))
    }

    fn block_mut(&mut self, id: Uuid) -> Result<&mut BlockInstance, SessionError> {
        let index = self.index_of(id)?;
        Ok(&mut self.doc.blocks[index])
    }

    /// Insert a new block of `block_type` seeded from its default props, at
    /// `at` or at the end.
    pub fn add_block(
        &mut self,
        registry: &BlockRegistry,
        block_type: &str,
        at: Option<usize>,
    ) -> Result<Uuid, SessionError> {
        let def = registry
            .get(block_type)
            .ok_or_else(|| SessionError::UnknownBlockType(block_type.to_string()))?;
        let len = self.doc.blocks.len();
        let index = at.unwrap_or(len);
        if index > len {
            return Err(SessionError::IndexOutOfRange { index, len });
        }
        let block = BlockInstance::from_definition(def);
        let id = block.id;
        self.doc.blocks.insert(index, block);
        self.touched();
        Ok(id)
    }

    pub fn remove_block(&mut self, id: Uuid) -> Result<BlockInstance, SessionError> {
        let index = self.index_of(id)?;
        let removed = self.doc.blocks.remove(index);
        self.touched();
        Ok(removed)
    }

    /// Insert a copy right after the original and return the copy's id.
    pub fn duplicate_block(&mut self, id: Uuid) -> Result<Uuid, SessionError> {
        let index = self.index_of(id)?;
        let copy = self.doc.blocks[index].duplicate();
        let copy_id = copy.id;
        self.doc.blocks.insert(index + 1, copy);
        self.touched();
        Ok(copy_id)
    }

    /// Move the block at `from` so it ends up at `to`. Only positions
    /// change; ids and props are untouched.
    pub fn move_block(&mut self, from: usize, to: usize) -> Result<(), SessionError> {
        let len = self.doc.blocks.len();
        for index in [from, to] {
            if index >= len {
                return Err(SessionError::IndexOutOfRange { index, len });
            }
        }
        if from != to {
            let block = self.doc.blocks.remove(from);
            self.doc.blocks.insert(to, block);
            self.touched();
        }
        Ok(())
    }

    /// Property-panel edit. Any field, any value.
    pub fn set_prop(&mut self, id: Uuid, field: &str, value: Value) -> Result<(), SessionError> {
        self.block_mut(id)?.props.insert(field.to_string(), value);
        self.touched();
        Ok(())
    }

    /// On-canvas text edit, limited to [`INLINE_EDITABLE`].
    pub fn inline_edit(&mut self, id: Uuid, field: &str, text: &str) -> Result<(), SessionError> {
        let block = self.block_mut(id)?;
        if !is_inline_editable(&block.block_type, field) {
            return Err(SessionError::NotInlineEditable {
                block_type: block.block_type.clone(),
                field: field.to_string(),
            });
        }
        block
            .props
            .insert(field.to_string(), Value::String(text.to_string()));
        self.touched();
        Ok(())
    }

    pub fn set_meta(&mut self, id: Uuid, meta: BlockMeta) -> Result<(), SessionError> {
        self.block_mut(id)?.meta = meta;
        self.touched();
        Ok(())
    }

    pub fn set_title(&mut self, title: &str) {
        self.doc.title = title.to_string();
        self.touched();
    }

    pub fn set_slug(&mut self, slug: &str) {
        self.doc.slug = slug.to_string();
        self.touched();
    }

    pub fn set_description(&mut self, description: &str) {
        self.doc.description = description.to_string();
        self.touched();
    }

    pub fn set_status(&mut self, status: PageStatus) {
        self.doc.status = status;
        self.touched();
    }

    pub fn set_seo(&mut self, seo: SeoFields) {
        self.doc.seo = seo;
        self.touched();
    }

    /// Enter `Saving` and return the page to send to the server.
    pub fn begin_save(&mut self) -> Result<PageDocument, SessionError> {
        match self.state {
            SessionState::Saving => Err(SessionError::SaveInFlight),
            SessionState::Clean => Err(SessionError::NothingToSave),
            SessionState::Dirty => {
                self.state = SessionState::Saving;
                self.last_error = None;
                Ok(self.doc.clone())
            }
        }
    }

    /// The server accepted the save and returned `persisted`. Server-owned
    /// fields (timestamps) are adopted; edits made while saving stay dirty.
    pub fn save_succeeded(&mut self, persisted: PageDocument) -> Result<(), SessionError> {
        if self.state != SessionState::Saving {
            return Err(SessionError::NotSaving);
        }
        self.saved = persisted.snapshot();
        self.doc.id = persisted.id;
        self.doc.created_at = persisted.created_at;
        self.doc.updated_at = persisted.updated_at;
        self.doc.published_at = persisted.published_at;
        self.state = SessionState::Dirty;
        self.touched();
        Ok(())
    }

    /// The save failed. Local edits are kept and the session is dirty again.
    pub fn save_failed(&mut self, error: impl Into<String>) -> Result<(), SessionError> {
        if self.state != SessionState::Saving {
            return Err(SessionError::NotSaving);
        }
        self.last_error = Some(error.into());
        self.state = SessionState::Dirty;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use std::collections::HashSet;

    fn page() -> PageDocument {
        let now = Utc::now();
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

    fn session_with(types: &[&str]) -> (EditingSession, BlockRegistry, Vec<Uuid>) {
        let registry = BlockRegistry::with_system_blocks();
        let mut session = EditingSession::new(page());
        let ids = types
            .iter()
            .map(|t| session.add_block(&registry, t, None).unwrap())
            .collect();
        (session, registry, ids)
    }

    #[test]
    fn edits_make_session_dirty_and_reverting_cleans_it() {
        let mut session = EditingSession::new(page());
        assert_eq!(session.state(), SessionState::Clean);
        session.set_title("Summer Promo");
        assert_eq!(session.state(), SessionState::Dirty);
        session.set_title("Spring Promo");
        assert_eq!(session.state(), SessionState::Clean);
    }

    #[test]
    fn add_block_uses_defaults_and_position() {
        let (mut session, registry, ids) = session_with(&["hero", "faq"]);
        let cta = session.add_block(&registry, "cta_band", Some(1)).unwrap();
        let order: Vec<_> = session.blocks().iter().map(|b| b.id).collect();
        assert_eq!(order, vec![ids[0], cta, ids[1]]);
        assert_eq!(
            session.blocks()[1].props,
            registry.get("cta_band").unwrap().default_props
        );
        assert_eq!(
            session.add_block(&registry, "nope", None),
            Err(SessionError::UnknownBlockType("nope".into()))
        );
        assert_eq!(
            session.add_block(&registry, "hero", Some(9)),
            Err(SessionError::IndexOutOfRange { index: 9, len: 3 })
        );
    }

    #[test]
    fn move_block_is_a_pure_permutation() {
        let (mut session, _, ids) = session_with(&["hero", "rich_text", "faq", "cta_band"]);
        let before: Vec<_> = session.blocks().to_vec();
        session.move_block(0, 3).unwrap();

        let order: Vec<_> = session.blocks().iter().map(|b| b.id).collect();
        assert_eq!(order, vec![ids[1], ids[2], ids[3], ids[0]]);

        let before_ids: HashSet<_> = before.iter().map(|b| b.id).collect();
        let after_ids: HashSet<_> = order.iter().copied().collect();
        assert_eq!(before_ids, after_ids);
        for block in session.blocks() {
            let original = before.iter().find(|b| b.id == block.id).unwrap();
            assert_eq!(original, block);
        }

        assert!(matches!(
            session.move_block(0, 4),
            Err(SessionError::IndexOutOfRange { index: 4, len: 4 })
        ));
    }

    #[test]
    fn duplicate_inserts_successor() {
        let (mut session, _, ids) = session_with(&["hero", "faq"]);
        let copy = session.duplicate_block(ids[0]).unwrap();
        let blocks = session.blocks();
        assert_eq!(blocks[1].id, copy);
        assert_eq!(blocks[1].props, blocks[0].props);
        assert_eq!(blocks[1].meta.label.as_deref(), Some("hero (copy)"));
        assert_eq!(blocks[2].id, ids[1]);
    }

    #[test]
    fn inline_edit_respects_allow_list() {
        let (mut session, _, ids) = session_with(&["hero", "faq"]);
        session.inline_edit(ids[0], "headline", "Clear It Fast").unwrap();
        assert_eq!(session.blocks()[0].str_prop("headline"), Some("Clear It Fast"));

        assert_eq!(
            session.inline_edit(ids[0], "imageUrl", "/x.jpg"),
            Err(SessionError::NotInlineEditable {
                block_type: "hero".into(),
                field: "imageUrl".into()
            })
        );
        assert!(session.inline_edit(ids[1], "heading", "FAQ").is_err());
        session.set_prop(ids[1], "heading", json!("Questions")).unwrap();
    }

    #[test]
    fn failed_save_keeps_edits() {
        let (mut session, _, ids) = session_with(&["hero"]);
        session.inline_edit(ids[0], "headline", "Unsaved").unwrap();
        let outgoing = session.begin_save().unwrap();
        assert_eq!(session.state(), SessionState::Saving);
        assert_eq!(session.begin_save(), Err(SessionError::SaveInFlight));

        session.save_failed("network down").unwrap();
        assert_eq!(session.state(), SessionState::Dirty);
        assert_eq!(session.last_error(), Some("network down"));
        assert_eq!(session.document().blocks, outgoing.blocks);
    }

    #[test]
    fn successful_save_cleans_unless_edited_meanwhile() {
        let (mut session, _, ids) = session_with(&["hero"]);
        let mut persisted = session.begin_save().unwrap();
        persisted.updated_at = Utc::now();
        session.save_succeeded(persisted.clone()).unwrap();
        assert_eq!(session.state(), SessionState::Clean);
        assert_eq!(session.begin_save(), Err(SessionError::NothingToSave));

        session.inline_edit(ids[0], "headline", "v2").unwrap();
        let sent = session.begin_save().unwrap();
        session.inline_edit(ids[0], "headline", "v3").unwrap();
        assert_eq!(session.state(), SessionState::Saving);
        session.save_succeeded(sent).unwrap();
        assert_eq!(session.state(), SessionState::Dirty);
    }

    #[test]
    fn load_resets_to_clean() {
        let (mut session, _, _) = session_with(&["hero"]);
        assert!(session.is_dirty());
        session.load(page());
        assert_eq!(session.state(), SessionState::Clean);
        assert!(session.blocks().is_empty());
    }
}
