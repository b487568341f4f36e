//! Built-in block catalog for the land-clearing marketing site.

use serde_json::{json, Map, Value};

use super::definition::{BlockDefinition, FieldDescriptor, FieldType};

fn props(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn system(
    key: &str,
    name: &str,
    category: &str,
    icon: &str,
    description: &str,
    default_props: Value,
    schema: Vec<FieldDescriptor>,
) -> BlockDefinition {
    BlockDefinition {
        key: key.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        icon: icon.to_string(),
        description: description.to_string(),
        default_props: props(default_props),
        schema,
        is_system: true,
    }
}

pub fn system_blocks() -> Vec<BlockDefinition> {
    use FieldType::*;

    vec![
        system(
            "hero",
            "Hero",
            "headers",
            "layout-template",
            "Full-width headline with background image and call to action.",
            json!({
                "headline": "Professional Land Clearing",
                "subheadline": "Forestry mulching, brush removal and lot clearing.",
                "imageUrl": "",
                "imageAlt": "",
                "ctaText": "Get a Free Quote",
                "ctaHref": "/quote",
            }),
            vec![
                FieldDescriptor::new("headline", "Headline", Text).required(),
                FieldDescriptor::new("subheadline", "Subheadline", Textarea),
                FieldDescriptor::new("imageUrl", "Background image", Image),
                FieldDescriptor::new("imageAlt", "Image alt text", Text),
                FieldDescriptor::new("ctaText", "Button text", Text),
                FieldDescriptor::new("ctaHref", "Button link", Text),
            ],
        ),
        system(
            "rich_text",
            "Rich Text",
            "content",
            "align-left",
            "Free-form formatted text.",
            json!({ "content": "" }),
            vec![FieldDescriptor::new("content", "Content", Textarea).required()],
        ),
        system(
            "feature_grid",
            "Feature Grid",
            "content",
            "grid",
            "Grid of features with icon, title and text.",
            json!({
                "heading": "Why Choose Us",
                "columns": 3,
                "items": [],
            }),
            vec![
                FieldDescriptor::new("heading", "Heading", Text),
                FieldDescriptor::new("columns", "Columns", Number),
                FieldDescriptor::new("items", "Features", Array).with_items(vec![
                    FieldDescriptor::new("icon", "Icon", Text),
                    FieldDescriptor::new("title", "Title", Text).required(),
                    FieldDescriptor::new("text", "Text", Textarea),
                ]),
            ],
        ),
        system(
            "cta_band",
            "CTA Band",
            "conversion",
            "megaphone",
            "Full-width call to action strip.",
            json!({
                "heading": "Ready to clear your land?",
                "buttonText": "Request a Quote",
                "buttonHref": "/quote",
                "variant": "primary",
            }),
            vec![
                FieldDescriptor::new("heading", "Heading", Text).required(),
                FieldDescriptor::new("buttonText", "Button text", Text).required(),
                FieldDescriptor::new("buttonHref", "Button link", Text).required(),
                FieldDescriptor::new("variant", "Style", Select)
                    .with_options(&["primary", "secondary", "dark"]),
            ],
        ),
        system(
            "image_banner",
            "Image Banner",
            "media",
            "image",
            "Wide image with optional caption.",
            json!({ "imageUrl": "", "alt": "", "caption": "" }),
            vec![
                FieldDescriptor::new("imageUrl", "Image", Image).required(),
                FieldDescriptor::new("alt", "Alt text", Text),
                FieldDescriptor::new("caption", "Caption", Text),
            ],
        ),
        system(
            "faq",
            "FAQ",
            "content",
            "help-circle",
            "Accordion of questions and answers.",
            json!({ "heading": "Frequently Asked Questions", "items": [] }),
            vec![
                FieldDescriptor::new("heading", "Heading", Text),
                FieldDescriptor::new("items", "Questions", Array).with_items(vec![
                    FieldDescriptor::new("question", "Question", Text).required(),
                    FieldDescriptor::new("answer", "Answer", Textarea).required(),
                ]),
            ],
        ),
        system(
            "testimonials",
            "Testimonials",
            "social",
            "quote",
            "Customer quotes with attribution.",
            json!({ "heading": "What Our Customers Say", "items": [] }),
            vec![
                FieldDescriptor::new("heading", "Heading", Text),
                FieldDescriptor::new("items", "Testimonials", Array).with_items(vec![
                    FieldDescriptor::new("quote", "Quote", Textarea).required(),
                    FieldDescriptor::new("author", "Author", Text).required(),
                    FieldDescriptor::new("location", "Location", Text),
                ]),
            ],
        ),
        system(
            "service_cards",
            "Service Cards",
            "content",
            "briefcase",
            "Cards linking to individual service pages.",
            json!({ "heading": "Our Services", "items": [] }),
            vec![
                FieldDescriptor::new("heading", "Heading", Text),
                FieldDescriptor::new("items", "Services", Array).with_items(vec![
                    FieldDescriptor::new("title", "Title", Text).required(),
                    FieldDescriptor::new("summary", "Summary", Textarea),
                    FieldDescriptor::new("imageUrl", "Image", Image),
                    FieldDescriptor::new("href", "Link", Text),
                ]),
            ],
        ),
        system(
            "stats_band",
            "Stats Band",
            "social",
            "bar-chart",
            "Row of headline numbers.",
            json!({ "items": [] }),
            vec![FieldDescriptor::new("items", "Stats", Array).with_items(vec![
                FieldDescriptor::new("value", "Value", Text).required(),
                FieldDescriptor::new("label", "Label", Text).required(),
            ])],
        ),
        system(
            "contact_form",
            "Contact Form",
            "conversion",
            "mail",
            "Lead capture form posting to the quote pipeline.",
            json!({
                "heading": "Tell us about your property",
                "submitText": "Send",
                "successUrl": "/quote/thanks",
            }),
            vec![
                FieldDescriptor::new("heading", "Heading", Text),
                FieldDescriptor::new("submitText", "Submit text", Text).required(),
                FieldDescriptor::new("successUrl", "Redirect after submit", Text),
            ],
        ),
    ]
}
