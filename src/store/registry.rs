//! Registry of open stores keyed by storage key.
//!
//! One registry per process replaces module-level singleton stores: the
//! first request for a key opens (and if needed seeds) its store, later
//! requests get the same instance. Facades receive the registry explicitly.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use crate::storage::{MemoryStorage, Storage};

use super::entity_store::{EntityStore, DEFAULT_STREAM_CAPACITY};

struct OpenStore {
    store: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

/// Lazily populated map from storage key to store instance.
pub struct StoreRegistry {
    storage: Arc<dyn Storage>,
    stream_capacity: usize,
    stores: Mutex<HashMap<String, OpenStore>>,
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("backend", &self.storage.name())
            .field("keys", &self.keys())
            .finish()
    }
}

impl StoreRegistry {
    /// Registry over an explicit backend.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_stream_capacity(storage, DEFAULT_STREAM_CAPACITY)
    }

    /// Registry whose stores buffer `stream_capacity` events per stream.
    #[must_use]
    pub fn with_stream_capacity(storage: Arc<dyn Storage>, stream_capacity: usize) -> Self {
        tracing::info!(backend = storage.name(), "store registry created");
        Self {
            storage,
            stream_capacity: stream_capacity.max(1),
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Registry backed by a fresh [`MemoryStorage`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// The backend shared by every store in this registry.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Get the store for `storage_key`, opening it on first request.
    ///
    /// `seed` is only used when the store is opened; it is ignored for a key
    /// that is already open.
    ///
    /// # Errors
    /// - `TypeMismatch` if the key was opened with another record type
    /// - any error from [`EntityStore::open`]
    pub fn store<T: Record>(
        &self,
        storage_key: &str,
        seed: &[T],
    ) -> StoreResult<Arc<EntityStore<T>>> {
        let mut stores = self
            .stores
            .lock()
            .map_err(|_| StoreError::poisoned("registry.store"))?;

        if let Some(open) = stores.get(storage_key) {
            return Arc::clone(&open.store)
                .downcast::<EntityStore<T>>()
                .map_err(|_| StoreError::TypeMismatch {
                    storage_key: storage_key.to_string(),
                    existing: open.type_name,
                });
        }

        let store = Arc::new(EntityStore::open_with_capacity(
            storage_key,
            seed,
            Arc::clone(&self.storage),
            self.stream_capacity,
        )?);
        tracing::debug!(storage_key, record_type = type_name::<T>(), "opened store");

        stores.insert(
            storage_key.to_string(),
            OpenStore {
                store: Arc::clone(&store) as Arc<dyn Any + Send + Sync>,
                type_name: type_name::<T>(),
            },
        );
        Ok(store)
    }

    /// True if `storage_key` has been opened.
    #[must_use]
    pub fn contains(&self, storage_key: &str) -> bool {
        self.stores
            .lock()
            .map(|stores| stores.contains_key(storage_key))
            .unwrap_or(false)
    }

    /// Storage keys opened so far, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .stores
            .lock()
            .map(|stores| stores.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;
    use crate::record::Document;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Tag {
        id: Option<String>,
        label: String,
    }

    impl Record for Tag {
        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }

        fn set_id(&mut self, id: String) {
            self.id = Some(id);
        }
    }

    #[test]
    fn test_same_key_returns_same_instance() {
        let registry = StoreRegistry::in_memory();
        let a = registry.store::<Document>("notes", &[]).unwrap();
        let b = registry.store::<Document>("notes", &[]).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(registry.contains("notes"));
        assert_eq!(registry.keys(), vec!["notes".to_string()]);
    }

    #[test]
    fn test_seed_ignored_once_open() {
        let registry = StoreRegistry::in_memory();
        let first = [Document::new().with("id", json!("1"))];
        let second = [Document::new().with("id", json!("2"))];

        registry.store("notes", &first).unwrap();
        let store = registry.store("notes", &second).unwrap();
        assert_eq!(store.list(&Query::new()), first.to_vec());
    }

    #[test]
    fn test_type_mismatch() {
        let registry = StoreRegistry::in_memory();
        registry.store::<Document>("tags", &[]).unwrap();

        let err = registry.store::<Tag>("tags", &[]).unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch { .. }));
    }

    #[test]
    fn test_stores_share_backend() {
        let registry = StoreRegistry::in_memory();
        let tags = registry.store::<Tag>("tags", &[]).unwrap();
        tags.create(Tag {
            id: None,
            label: "mentoria".to_string(),
        })
        .unwrap();

        let raw = registry.storage().load("tags").unwrap().unwrap();
        assert!(raw.contains("mentoria"));
    }
}
