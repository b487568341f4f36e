use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Editor control used for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Select,
    Image,
    Array,
    Number,
}

/// One entry of a block schema. `array` fields describe their repeating
/// items through `item_fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_fields: Option<Vec<FieldDescriptor>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

impl FieldDescriptor {
    pub fn new(key: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            field_type,
            options: None,
            item_fields: None,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = Some(options.iter().map(|o| o.to_string()).collect());
        self
    }

    pub fn with_items(mut self, items: Vec<FieldDescriptor>) -> Self {
        self.item_fields = Some(items);
        self
    }
}

/// Catalog entry describing a block type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDefinition {
    pub key: String,
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_props: Map<String, Value>,
    #[serde(default)]
    pub schema: Vec<FieldDescriptor>,
    #[serde(default)]
    pub is_system: bool,
}

fn default_category() -> String {
    "custom".to_string()
}

impl BlockDefinition {
    /// Find a top-level schema field by key.
    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.schema.iter().find(|f| f.key == key)
    }
}
