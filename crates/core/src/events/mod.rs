//! Change notifications for admin listeners. Emitted only after a write has
//! been committed.

pub mod bus;
pub mod types;

pub use bus::EventBus;
pub use types::{PageEvent, PageEventKind, SiteEvent};
