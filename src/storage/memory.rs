//! In-memory storage backend.
//!
//! Thread-safe map of storage key to serialized collection. It is intended
//! for embedded usage, tests, and as the fallback when no durable location
//! is configured. Contents live for the lifetime of the value.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::storage::traits::{validate_key, Storage, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::Backend(format!("poisoned lock: {context}"))
}

/// Thread-safe in-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create a new empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots written so far.
    pub fn slot_count(&self) -> Result<usize, StorageError> {
        let slots = self.slots.read().map_err(|_| lock_err("memory.slot_count"))?;
        Ok(slots.len())
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        let slots = self.slots.read().map_err(|_| lock_err("memory.load"))?;
        Ok(slots.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut slots = self.slots.write().map_err(|_| lock_err("memory.save"))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_slot() {
        let storage = MemoryStorage::new();
        assert!(storage.load("feedback").unwrap().is_none());
        assert_eq!(storage.slot_count().unwrap(), 0);
    }

    #[test]
    fn test_save_overwrites() {
        let storage = MemoryStorage::new();
        storage.save("forum_topics", "[]").unwrap();
        storage.save("forum_topics", r#"[{"id":"1"}]"#).unwrap();

        assert_eq!(
            storage.load("forum_topics").unwrap().as_deref(),
            Some(r#"[{"id":"1"}]"#)
        );
        assert_eq!(storage.slot_count().unwrap(), 1);
    }

    #[test]
    fn test_rejects_invalid_key() {
        let storage = MemoryStorage::new();
        assert!(storage.save("no/slash", "[]").is_err());
    }
}
