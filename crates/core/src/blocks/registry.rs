use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use super::definition::BlockDefinition;
use super::seed::system_blocks;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("block type `{0}` already exists")]
    Duplicate(String),
    #[error("block type `{0}` not found")]
    NotFound(String),
    #[error("block type `{0}` is a system block and cannot be deleted")]
    SystemBlock(String),
    #[error("block key must be non-empty snake_case, got `{0}`")]
    InvalidKey(String),
}

/// Definitions sharing a category, as shown in the editor palette.
#[derive(Debug, Clone, Serialize)]
pub struct BlockCategory {
    pub category: String,
    pub blocks: Vec<BlockDefinition>,
}

/// Catalog of block types keyed by `key`.
///
/// Constructed explicitly and handed to whoever needs it; there is no global
/// instance. Iteration order is by key so listings are stable.
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    definitions: BTreeMap<String, BlockDefinition>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the built-in catalog.
    pub fn with_system_blocks() -> Self {
        let mut registry = Self::new();
        for def in system_blocks() {
            registry.definitions.insert(def.key.clone(), def);
        }
        registry
    }

    pub fn get(&self, key: &str) -> Option<&BlockDefinition> {
        self.definitions.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.definitions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// All definitions, optionally filtered by a case-insensitive substring
    /// of `name` or `key`.
    pub fn list(&self, search: Option<&str>) -> Vec<BlockDefinition> {
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        self.definitions
            .values()
            .filter(|def| match &needle {
                Some(n) => def.name.to_lowercase().contains(n) || def.key.to_lowercase().contains(n),
                None => true,
            })
            .cloned()
            .collect()
    }

    /// Same as [`list`](Self::list), grouped by category. Categories are
    /// sorted by name and blocks within a category by display name.
    pub fn grouped(&self, search: Option<&str>) -> Vec<BlockCategory> {
        let mut groups: BTreeMap<String, Vec<BlockDefinition>> = BTreeMap::new();
        for def in self.list(search) {
            groups.entry(def.category.clone()).or_default().push(def);
        }
        groups
            .into_iter()
            .map(|(category, mut blocks)| {
                blocks.sort_by(|a, b| a.name.cmp(&b.name));
                BlockCategory { category, blocks }
            })
            .collect()
    }

    /// Register a custom definition. Custom definitions are never system
    /// definitions, whatever the caller sent.
    pub fn create(&mut self, mut def: BlockDefinition) -> Result<&BlockDefinition, RegistryError> {
        if !is_valid_key(&def.key) {
            return Err(RegistryError::InvalidKey(def.key));
        }
        if self.definitions.contains_key(&def.key) {
            return Err(RegistryError::Duplicate(def.key));
        }
        def.is_system = false;
        let key = def.key.clone();
        Ok(self.definitions.entry(key).or_insert(def))
    }

    /// Load a previously persisted custom definition. Keys that collide with
    /// an existing definition are skipped so system blocks always win.
    pub fn load_custom(&mut self, mut def: BlockDefinition) -> bool {
        if self.definitions.contains_key(&def.key) {
            tracing::warn!(key = %def.key, "skipping persisted block definition that shadows an existing key");
            return false;
        }
        def.is_system = false;
        self.definitions.insert(def.key.clone(), def);
        true
    }

    pub fn remove(&mut self, key: &str) -> Result<BlockDefinition, RegistryError> {
        match self.definitions.get(key) {
            None => Err(RegistryError::NotFound(key.to_string())),
            Some(def) if def.is_system => Err(RegistryError::SystemBlock(key.to_string())),
            Some(_) => self
                .definitions
                .remove(key)
                .ok_or_else(|| RegistryError::NotFound(key.to_string())),
        }
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.starts_with(|c: char| c.is_ascii_lowercase())
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
