//! Entity stores and the registry that owns them.

mod entity_store;
mod registry;

pub use entity_store::{EntityStore, DEFAULT_STREAM_CAPACITY};
pub use registry::StoreRegistry;
