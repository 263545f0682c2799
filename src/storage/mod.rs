//! Storage backends for portal-store.
//!
//! A backend holds one serialized collection per storage key. The entity
//! store decides what goes into a slot; backends only read and overwrite.

mod file;
mod memory;
mod traits;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use traits::{validate_key, Storage, StorageError};
