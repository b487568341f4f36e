//! Advisory page checks.
//!
//! [`validate`] never fails and never blocks a save. It is a pure function of
//! the page and the registry, so the editor can re-run it on every keystroke
//! and get the same list for the same input.

use serde_json::{Map, Value};

use crate::blocks::{BlockInstance, BlockRegistry, FieldDescriptor, FieldType};
use crate::page::PageDocument;

const SEO_TITLE_RANGE: (usize, usize) = (30, 60);
const META_DESCRIPTION_RANGE: (usize, usize) = (50, 160);
const LINK_PREFIXES: [&str; 5] = ["/", "http", "mailto:", "tel:", "#"];
const QUOTE_PATH: &str = "/quote";

pub fn validate(doc: &PageDocument, registry: &BlockRegistry) -> Vec<String> {
    let mut warnings = Vec::new();

    if !doc.blocks.iter().any(has_heading) {
        warnings.push("Missing headline: add a hero headline or a rich text block.".to_string());
    }
    if !doc.blocks.iter().any(|b| props_contain(&b.props, QUOTE_PATH)) {
        warnings.push("No CTA to quote: no block links to /quote.".to_string());
    }

    for (index, block) in doc.blocks.iter().enumerate() {
        let name = format!("Block {} ({})", index + 1, block.label());
        check_images(block, &name, &mut warnings);
        check_links(&block.props, "", &name, &mut warnings);
        if let Some(def) = registry.get(&block.block_type) {
            check_required(&def.schema, &block.props, "", &name, &mut warnings);
        }
    }

    check_seo(doc, &mut warnings);
    warnings
}

fn has_heading(block: &BlockInstance) -> bool {
    let field = match block.block_type.as_str() {
        "hero" => "headline",
        "rich_text" => "content",
        _ => return false,
    };
    block.str_prop(field).is_some_and(|s| !s.trim().is_empty())
}

fn props_contain(props: &Map<String, Value>, needle: &str) -> bool {
    props.values().any(|v| value_contains(v, needle))
}

fn value_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.contains(needle),
        Value::Array(items) => items.iter().any(|v| value_contains(v, needle)),
        Value::Object(map) => props_contain(map, needle),
        _ => false,
    }
}

fn check_images(block: &BlockInstance, name: &str, warnings: &mut Vec<String>) {
    if !matches!(block.block_type.as_str(), "hero" | "image_banner") {
        return;
    }
    let image = block.str_prop("imageUrl").map(str::trim).unwrap_or_default();
    if image.is_empty() {
        warnings.push(format!("{name}: missing image."));
        return;
    }
    let has_alt = ["imageAlt", "alt"]
        .iter()
        .any(|key| block.str_prop(key).is_some_and(|s| !s.trim().is_empty()));
    if !has_alt {
        warnings.push(format!("{name}: image is missing alt text."));
    }
}

fn is_link_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.contains("href") || key.contains("url")
}

fn is_acceptable_link(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || LINK_PREFIXES.iter().any(|p| value.starts_with(p))
}

fn check_links(props: &Map<String, Value>, prefix: &str, name: &str, warnings: &mut Vec<String>) {
    for (key, value) in props {
        let path = join_path(prefix, key);
        match value {
            Value::String(s) if is_link_key(key) && !is_acceptable_link(s) => {
                warnings.push(format!("{name}: field `{path}` has an invalid link \"{s}\"."));
            }
            Value::Object(map) => check_links(map, &path, name, warnings),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if let Value::Object(map) = item {
                        check_links(map, &format!("{path}[{i}]"), name, warnings);
                    }
                }
            }
            _ => {}
        }
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

fn check_required(
    schema: &[FieldDescriptor],
    props: &Map<String, Value>,
    context: &str,
    name: &str,
    warnings: &mut Vec<String>,
) {
    for field in schema {
        let value = props.get(&field.key);
        if field.required && is_empty_value(value) {
            warnings.push(format!("{name}: {context}{} is required.", field.label));
            continue;
        }
        let (FieldType::Array, Some(item_fields), Some(Value::Array(items))) =
            (field.field_type, field.item_fields.as_deref(), value)
        else {
            continue;
        };
        for (i, item) in items.iter().enumerate() {
            if let Value::Object(item_props) = item {
                let item_context = format!("{context}{} item {}: ", field.label, i + 1);
                check_required(item_fields, item_props, &item_context, name, warnings);
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn check_seo(doc: &PageDocument, warnings: &mut Vec<String>) {
    let seo_title = non_empty(doc.seo.title.as_deref());
    let meta_description = non_empty(doc.seo.meta_description.as_deref());

    if let Some(title) = seo_title {
        let len = title.chars().count();
        let (min, max) = SEO_TITLE_RANGE;
        if len < min || len > max {
            warnings.push(format!(
                "SEO title is {len} characters; aim for {min}-{max}."
            ));
        }
    }
    if let Some(description) = meta_description {
        let len = description.chars().count();
        let (min, max) = META_DESCRIPTION_RANGE;
        if len < min || len > max {
            warnings.push(format!(
                "Meta description is {len} characters; aim for {min}-{max}."
            ));
        }
    }
    if seo_title.is_none() && doc.title.trim().is_empty() {
        warnings.push("Missing title: set a page title or SEO title.".to_string());
    }
    if meta_description.is_none() {
        warnings.push("Missing meta description.".to_string());
    }
    if non_empty(doc.seo.og_image.as_deref()).is_none() {
        warnings.push("Missing social share image (OG image).".to_string());
    }
}
