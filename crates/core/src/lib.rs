//! Page-builder engine for the marketing site CMS.
//!
//! Block catalog, page documents, the client editing session, advisory
//! validation, revisions, preview tokens and public resolution, plus the
//! persistence seam they share.

pub mod blocks;
pub mod clock;
pub mod error;
pub mod events;
pub mod page;
pub mod preview;
pub mod resolver;
pub mod revision;
pub mod service;
pub mod session;
pub mod store;
pub mod warnings;

pub use error::{ServiceError, ServiceResult};
pub use service::{PageService, PreviewLink, ServiceConfig};
