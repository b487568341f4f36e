use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::definition::BlockDefinition;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
}

/// A block placed on a page.
///
/// `props` is deliberately untyped. The definition schema guides the editor
/// and the advisory validator but is never enforced when a page is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInstance {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub props: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Map<String, Value>>,
    #[serde(default)]
    pub meta: BlockMeta,
}

impl BlockInstance {
    /// New instance seeded from the definition's default props.
    pub fn from_definition(def: &BlockDefinition) -> Self {
        Self {
            id: Uuid::new_v4(),
            block_type: def.key.clone(),
            props: def.default_props.clone(),
            style: None,
            meta: BlockMeta::default(),
        }
    }

    /// Copy with a new id and a "(copy)" label.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = Uuid::new_v4();
        copy.meta.label = Some(format!("{} (copy)", self.label()));
        copy
    }

    /// Copy with a new id and otherwise identical content.
    pub fn with_fresh_id(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }

    /// Human label: the explicit `meta.label`, else the block type.
    pub fn label(&self) -> &str {
        self.meta
            .label
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(&self.block_type)
    }

    pub fn is_hidden(&self) -> bool {
        self.meta.hidden.unwrap_or(false)
    }

    /// String prop, if present and a string.
    pub fn str_prop(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }
}
