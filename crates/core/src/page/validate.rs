//! Write-time input shape checks.
//!
//! These reject malformed requests with a field-level error list. They say
//! nothing about block props, which stay lenient; see [`crate::warnings`]
//! for the advisory pass.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::blocks::BlockInstance;

const MAX_TITLE_LEN: usize = 200;
const MAX_SLUG_LEN: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Collects field errors across several checks.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn into_result(self) -> Result<(), Vec<FieldError>> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self.0)
        }
    }
}

pub fn check_title(title: &str, errors: &mut FieldErrors) {
    if title.trim().is_empty() {
        errors.push("title", "title is required");
    } else if title.chars().count() > MAX_TITLE_LEN {
        errors.push("title", format!("title must be at most {MAX_TITLE_LEN} characters"));
    }
}

pub fn check_slug(slug: &str, errors: &mut FieldErrors) {
    if slug.is_empty() {
        errors.push("slug", "slug is required");
    } else if slug.len() > MAX_SLUG_LEN {
        errors.push("slug", format!("slug must be at most {MAX_SLUG_LEN} characters"));
    } else if !is_valid_slug(slug) {
        errors.push(
            "slug",
            "slug may only contain lowercase letters, digits, single hyphens and `/` between segments",
        );
    }
}

pub fn check_page_type(page_type: &str, errors: &mut FieldErrors) {
    if page_type.trim().is_empty() {
        errors.push("pageType", "pageType cannot be empty");
    }
}

/// Instance ids must be unique within a page and every block needs a type.
/// Unknown types are allowed; they fall back at render time.
pub fn check_blocks(blocks: &[BlockInstance], errors: &mut FieldErrors) {
    let mut seen = HashSet::new();
    for (index, block) in blocks.iter().enumerate() {
        if !seen.insert(block.id) {
            errors.push(format!("blocks[{index}].id"), format!("duplicate block id {}", block.id));
        }
        if block.block_type.trim().is_empty() {
            errors.push(format!("blocks[{index}].type"), "block type is required");
        }
    }
}

/// Slug for the `n`th copy of a page: `<base>-copy`, then `<base>-copy-N`.
/// The base is shortened when needed so the result stays a valid slug.
pub fn copy_slug(base: &str, n: usize) -> String {
    let suffix = if n <= 1 {
        "-copy".to_string()
    } else {
        format!("-copy-{n}")
    };
    let room = MAX_SLUG_LEN.saturating_sub(suffix.len());
    let cut = base.char_indices().nth(room).map_or(base.len(), |(i, _)| i);
    let stem = base[..cut].trim_end_matches(['-', '/']);
    format!("{stem}{suffix}")
}

/// `segment(/segment)*` where a segment is lowercase alphanumerics joined
/// by single hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    slug.split('/').all(|segment| {
        !segment.is_empty()
            && !segment.starts_with('-')
            && !segment.ends_with('-')
            && !segment.contains("--")
            && segment
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use uuid::Uuid;

    #[test]
    fn slug_format() {
        assert!(is_valid_slug("spring-promo"));
        assert!(is_valid_slug("services/forestry-mulching"));
        assert!(is_valid_slug("home"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Spring"));
        assert!(!is_valid_slug("spring--promo"));
        assert!(!is_valid_slug("-spring"));
        assert!(!is_valid_slug("/spring"));
        assert!(!is_valid_slug("spring promo"));
    }

    #[test]
    fn copy_slugs_stay_within_the_length_limit() {
        assert_eq!(copy_slug("promo", 1), "promo-copy");
        assert_eq!(copy_slug("promo", 3), "promo-copy-3");

        let long = format!("{}-{}", "a".repeat(114), "b".repeat(5));
        assert_eq!(long.len(), MAX_SLUG_LEN);
        for n in [1, 2, 10] {
            let slug = copy_slug(&long, n);
            assert!(slug.len() <= MAX_SLUG_LEN, "{slug} is too long");
            assert!(is_valid_slug(&slug), "{slug} is not a valid slug");
            let mut errors = FieldErrors::default();
            check_slug(&slug, &mut errors);
            assert!(errors.into_result().is_ok());
        }
        // The cut lands right after the hyphen, which must not survive.
        assert_eq!(copy_slug(&long, 1), format!("{}-copy", "a".repeat(114)));
    }

    #[test]
    fn collects_every_error() {
        let mut errors = FieldErrors::default();
        check_title("  ", &mut errors);
        check_slug("Bad Slug", &mut errors);
        let fields: Vec<_> = errors
            .into_result()
            .unwrap_err()
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["title", "slug"]);
    }

    #[test]
    fn duplicate_block_ids_are_rejected() {
        let id = Uuid::new_v4();
        let block = BlockInstance {
            id,
            block_type: "hero".into(),
            props: Map::new(),
            style: None,
            meta: Default::default(),
        };
        let mut errors = FieldErrors::default();
        check_blocks(&[block.clone(), block], &mut errors);
        let errs = errors.into_result().unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field, "blocks[1].id");
    }
}
