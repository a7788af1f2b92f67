//! Playbook: sectioned, tagged advice entries persisted as JSON.

pub mod error;
pub mod render;
pub mod stats;
pub mod store;
pub mod types;

pub use error::{PlaybookError, Result};
pub use render::{RenderedEntry, parse_rendered};
pub use stats::TagSummary;
pub use store::PlaybookStore;
pub use types::{DEFAULT_SECTION, Entry, Playbook, Section};
