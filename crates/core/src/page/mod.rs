pub mod input;
pub mod model;
pub mod validate;

pub use input::{NewPage, NewRevision, NewTemplate, PageFilter, PagePatch, StatusTransition};
pub use model::{default_page_type, PageDocument, PageSnapshot, PageStatus, PageTemplate, SeoFields};
pub use validate::FieldError;
