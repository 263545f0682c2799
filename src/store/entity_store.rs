//! Generic persisted collection with query, mutation and change
//! notification.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};
use crate::notify::{
    ChangeEvent, ChangeKind, ChangeStream, Listeners, Subscription, CHANGE_EVENT,
};
use crate::query::{Criteria, Query};
use crate::record::{json_kind, new_record_id, shallow_merge, to_fields, Record};
use crate::storage::{validate_key, Storage, StorageError};

/// Default buffer size for [`EntityStore::watch`] streams.
pub const DEFAULT_STREAM_CAPACITY: usize = 256;

/// Ordered collection of `T` bound to one storage key.
///
/// Mutations hold the collection's write lock while they append or merge and
/// persist, so two mutations never interleave. Change handlers run after the
/// lock is released and may read the store.
pub struct EntityStore<T: Record> {
    storage_key: String,
    records: RwLock<Vec<T>>,
    storage: Arc<dyn Storage>,
    degraded: AtomicBool,
    listeners: Arc<Listeners>,
    stream_capacity: usize,
}

impl<T: Record> std::fmt::Debug for EntityStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("storage_key", &self.storage_key)
            .field("len", &self.len())
            .field("backend", &self.storage.name())
            .field("degraded", &self.is_degraded())
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl<T: Record> EntityStore<T> {
    /// Open the collection stored under `storage_key`.
    ///
    /// If the slot has never been written, the collection starts as a copy
    /// of `seed` and is persisted immediately. A slot that cannot be parsed
    /// is reseeded and overwritten. If the backend itself is unreachable the
    /// store starts from `seed` in memory and stays memory-only.
    ///
    /// # Errors
    /// - `Storage(InvalidKey)` if `storage_key` is not addressable
    /// - `Serialization` if the seed cannot be serialized
    pub fn open(
        storage_key: impl Into<String>,
        seed: &[T],
        storage: Arc<dyn Storage>,
    ) -> StoreResult<Self> {
        Self::open_with_capacity(storage_key, seed, storage, DEFAULT_STREAM_CAPACITY)
    }

    /// Like [`EntityStore::open`] with an explicit change stream capacity.
    pub fn open_with_capacity(
        storage_key: impl Into<String>,
        seed: &[T],
        storage: Arc<dyn Storage>,
        stream_capacity: usize,
    ) -> StoreResult<Self> {
        let storage_key = storage_key.into();
        validate_key(&storage_key)?;

        let store = Self {
            storage_key,
            records: RwLock::new(Vec::new()),
            storage,
            degraded: AtomicBool::new(false),
            listeners: Arc::new(Listeners::default()),
            stream_capacity: stream_capacity.max(1),
        };

        let loaded = match store.storage.load(&store.storage_key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<T>>(&raw) {
                Ok(records) => {
                    tracing::debug!(
                        storage_key = %store.storage_key,
                        count = records.len(),
                        "loaded persisted collection"
                    );
                    Some(records)
                }
                Err(e) => {
                    let err = StorageError::Corrupt {
                        key: store.storage_key.clone(),
                        reason: e.to_string(),
                    };
                    tracing::warn!(error = %err, "reseeding unreadable collection");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                store.degrade(&e);
                None
            }
        };

        let records = match loaded {
            Some(records) => records,
            None => {
                let records = seed.to_vec();
                tracing::debug!(
                    storage_key = %store.storage_key,
                    count = records.len(),
                    "seeding collection"
                );
                store.persist(&records)?;
                records
            }
        };

        *store
            .records
            .write()
            .map_err(|_| StoreError::poisoned("store.open"))? = records;
        Ok(store)
    }

    /// Storage key this store is bound to.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// True once persistence has failed and the store runs memory-only.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// True when the collection holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// All records, ordered and truncated per `query`.
    #[must_use]
    pub fn list(&self, query: &Query) -> Vec<T> {
        let records = self.read();
        select(records.iter(), None, query)
    }

    /// Records matching every field in `criteria`, ordered and truncated per
    /// `query`. Empty criteria behaves like [`EntityStore::list`].
    #[must_use]
    pub fn filter(&self, criteria: &Criteria, query: &Query) -> Vec<T> {
        if criteria.is_empty() {
            return self.list(query);
        }
        let records = self.read();
        select(records.iter(), Some(criteria), query)
    }

    /// The record whose id equals `id`.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<T> {
        self.read().iter().find(|r| r.id() == Some(id)).cloned()
    }

    /// Append a record.
    ///
    /// A record without an id gets a fresh one; store-assigned defaults are
    /// applied through [`Record::on_create`]. Handlers fire after the
    /// collection has been persisted.
    ///
    /// # Errors
    /// - `DuplicateId` if the record carries an id already in use
    /// - `Serialization` if the collection cannot be serialized
    pub fn create(&self, mut record: T) -> StoreResult<T> {
        let id = {
            let mut records = self
                .records
                .write()
                .map_err(|_| StoreError::poisoned("store.create"))?;

            let id = match record.id().filter(|id| !id.is_empty()) {
                Some(id) if records.iter().any(|r| r.id() == Some(id)) => {
                    return Err(StoreError::DuplicateId {
                        storage_key: self.storage_key.clone(),
                        id: id.to_string(),
                    });
                }
                Some(id) => id.to_string(),
                None => {
                    let mut id = new_record_id();
                    while records.iter().any(|r| r.id() == Some(id.as_str())) {
                        id = new_record_id();
                    }
                    record.set_id(id.clone());
                    id
                }
            };
            record.on_create(Utc::now());

            records.push(record.clone());
            if let Err(e) = self.persist(&records) {
                records.pop();
                return Err(e);
            }
            id
        };

        self.notify(ChangeKind::Created, &id);
        Ok(record)
    }

    /// Shallow-merge `updates` into the record at `id`.
    ///
    /// `updates` must serialize to a JSON object. Fields it names overwrite
    /// the stored ones, everything else is kept, and the id never changes.
    ///
    /// # Errors
    /// - `NotFound` if no record has this id (the collection is unchanged)
    /// - `InvalidPatch` if `updates` is not an object
    /// - `Serialization` if the merged record no longer fits `T`
    pub fn update<P: Serialize + ?Sized>(&self, id: &str, updates: &P) -> StoreResult<T> {
        let patch = patch_fields(updates)?;

        let updated = {
            let mut records = self
                .records
                .write()
                .map_err(|_| StoreError::poisoned("store.update"))?;

            let idx = records
                .iter()
                .position(|r| r.id() == Some(id))
                .ok_or_else(|| StoreError::NotFound {
                    storage_key: self.storage_key.clone(),
                    id: id.to_string(),
                })?;

            let merged = shallow_merge(&records[idx], &patch)?;
            let previous = std::mem::replace(&mut records[idx], merged.clone());
            if let Err(e) = self.persist(&records) {
                records[idx] = previous;
                return Err(e);
            }
            merged
        };

        self.notify(ChangeKind::Updated, id);
        Ok(updated)
    }

    /// Register `handler` for `event`.
    ///
    /// The store fires [`CHANGE_EVENT`] after every `create`/`update`; handlers
    /// registered under any other name are kept but never invoked.
    pub fn subscribe<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(event, handler)
    }

    /// Open a buffered stream of change events.
    #[must_use]
    pub fn watch(&self) -> ChangeStream {
        self.listeners.watch(self.stream_capacity)
    }

    /// Number of registered change handlers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.listeners.handler_count()
    }

    /// Events dropped because a stream buffer was full.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.listeners.dropped_events()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<T>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, kind: ChangeKind, record_id: &str) {
        let event = ChangeEvent::new(&self.storage_key, kind, record_id);
        self.listeners.emit(CHANGE_EVENT, &event);
    }

    fn degrade(&self, err: &StorageError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            tracing::warn!(
                storage_key = %self.storage_key,
                backend = self.storage.name(),
                error = %err,
                "persistence unavailable; continuing in memory only"
            );
        }
    }

    fn persist(&self, records: &[T]) -> StoreResult<()> {
        if self.is_degraded() {
            return Ok(());
        }
        let raw = serde_json::to_string(records)?;
        if let Err(e) = self.storage.save(&self.storage_key, &raw) {
            self.degrade(&e);
        }
        Ok(())
    }
}

fn patch_fields<P: Serialize + ?Sized>(updates: &P) -> StoreResult<Map<String, Value>> {
    match serde_json::to_value(updates)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidPatch {
            kind: json_kind(&other),
        }),
    }
}

fn select<'a, T: Record>(
    records: impl Iterator<Item = &'a T>,
    criteria: Option<&Criteria>,
    query: &Query,
) -> Vec<T> {
    let limit = query.limit.unwrap_or(usize::MAX);

    if criteria.is_none() && query.sort.is_none() {
        return records.take(limit).cloned().collect();
    }

    let mut rows: Vec<(Map<String, Value>, &T)> = records
        .map(|r| (to_fields(r).unwrap_or_default(), r))
        .filter(|(fields, _)| criteria.map_or(true, |c| c.matches(fields)))
        .collect();

    if let Some(sort) = &query.sort {
        rows.sort_by(|(a, _), (b, _)| sort.compare(a, b));
    }

    rows.into_iter().take(limit).map(|(_, r)| r.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Document;
    use crate::storage::MemoryStorage;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug)]
    struct FailingStorage;

    impl Storage for FailingStorage {
        fn load(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Backend("offline".to_string()))
        }

        fn save(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend("offline".to_string()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    /// Loads as empty and accepts `allowed` saves, then fails every save.
    #[derive(Debug)]
    struct SavesThenFails {
        allowed: usize,
        saves: AtomicUsize,
    }

    impl SavesThenFails {
        fn new(allowed: usize) -> Self {
            Self {
                allowed,
                saves: AtomicUsize::new(0),
            }
        }
    }

    impl Storage for SavesThenFails {
        fn load(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn save(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            if self.saves.fetch_add(1, Ordering::SeqCst) < self.allowed {
                Ok(())
            } else {
                Err(StorageError::Backend("disk full".to_string()))
            }
        }

        fn name(&self) -> &'static str {
            "saves-then-fails"
        }
    }

    fn doc(value: Value) -> Document {
        Document::try_from(value).unwrap()
    }

    fn seed() -> Vec<Document> {
        vec![
            doc(json!({"id": "c1", "name": "Projetos", "order": 2})),
            doc(json!({"id": "c2", "name": "Carreira", "order": 1})),
            doc(json!({"id": "c3", "name": "Eventos", "order": 3})),
        ]
    }

    fn open(storage: Arc<dyn Storage>) -> EntityStore<Document> {
        EntityStore::open("categories", &seed(), storage).unwrap()
    }

    fn ids(records: &[Document]) -> Vec<&str> {
        records.iter().filter_map(Record::id).collect()
    }

    #[test]
    fn test_seed_is_listed_in_order_and_persisted() {
        let storage = Arc::new(MemoryStorage::new());
        let store = open(storage.clone());

        assert_eq!(store.list(&Query::new()), seed());
        let raw = storage.load("categories").unwrap().unwrap();
        let persisted: Vec<Document> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, seed());
    }

    #[test]
    fn test_existing_slot_wins_over_seed() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save("categories", r#"[{"id":"x","name":"Persisted"}]"#).unwrap();

        let store = open(storage);
        assert_eq!(ids(&store.list(&Query::new())), vec!["x"]);
    }

    #[test]
    fn test_corrupt_slot_is_reseeded() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save("categories", "{broken").unwrap();

        let store = open(storage.clone());
        assert_eq!(store.len(), 3);
        assert!(!store.is_degraded());
        let raw = storage.load("categories").unwrap().unwrap();
        assert!(raw.starts_with('['));
    }

    #[test]
    fn test_list_sort_and_limit() {
        let store = open(Arc::new(MemoryStorage::new()));

        let asc = store.list(&Query::new().sort("order"));
        assert_eq!(ids(&asc), vec!["c2", "c1", "c3"]);

        let desc = store.list(&Query::new().sort("-order").limit(2));
        assert_eq!(ids(&desc), vec!["c3", "c1"]);

        assert!(store.list(&Query::new().limit(0)).is_empty());
    }

    #[test]
    fn test_sort_is_stable_for_ties_and_missing_fields() {
        let store = EntityStore::open(
            "ties",
            &[
                doc(json!({"id": "a", "rank": 1})),
                doc(json!({"id": "b"})),
                doc(json!({"id": "c", "rank": 1})),
            ],
            Arc::new(MemoryStorage::new()),
        )
        .unwrap();

        assert_eq!(ids(&store.list(&Query::new().sort("rank"))), vec!["b", "a", "c"]);
        assert_eq!(ids(&store.list(&Query::new().sort("-rank"))), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_filter_is_subset_of_list() {
        let store = open(Arc::new(MemoryStorage::new()));

        let hits = store.filter(&Criteria::new().field("name", "Carreira"), &Query::new());
        assert_eq!(ids(&hits), vec!["c2"]);
        assert_eq!(store.filter(&Criteria::new(), &Query::new()), store.list(&Query::new()));
        assert!(store
            .filter(&Criteria::new().field("name", "carreira"), &Query::new())
            .is_empty());
    }

    #[test]
    fn test_create_assigns_unique_id() {
        let store = open(Arc::new(MemoryStorage::new()));

        let created = store.create(doc(json!({"name": "Dúvidas"}))).unwrap();
        let id = created.id().unwrap().to_string();
        assert_eq!(store.find_by_id(&id), Some(created));
        assert_eq!(store.len(), 4);
        assert_eq!(ids(&store.list(&Query::new()))[3], id);
    }

    #[test]
    fn test_create_rejects_duplicate_id() {
        let store = open(Arc::new(MemoryStorage::new()));

        let err = store.create(doc(json!({"id": "c1"}))).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_update_merges_and_persists() {
        let storage = Arc::new(MemoryStorage::new());
        let store = open(storage.clone());

        let updated = store.update("c1", &json!({"order": 9})).unwrap();
        assert_eq!(updated.get("order"), Some(&json!(9)));
        assert_eq!(updated.get("name"), Some(&json!("Projetos")));

        let reopened = open(storage);
        assert_eq!(reopened.find_by_id("c1"), Some(updated));
    }

    #[test]
    fn test_update_missing_id_is_not_found() {
        let store = open(Arc::new(MemoryStorage::new()));

        let err = store.update("nope", &json!({"order": 1})).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.list(&Query::new()), seed());
    }

    #[test]
    fn test_update_rejects_non_object_patch() {
        let store = open(Arc::new(MemoryStorage::new()));
        let err = store.update("c1", &json!("rename")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPatch { kind: "string" }));
    }

    #[test]
    fn test_handlers_fire_once_per_mutation() {
        let store = open(Arc::new(MemoryStorage::new()));
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        let sub = store.subscribe(CHANGE_EVENT, move |event| {
            assert_eq!(event.storage_key, "categories");
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.create(doc(json!({"name": "Novo"}))).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        store.update("c1", &json!({"name": "Projetos 2"})).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        assert!(sub.unsubscribe());
        store.create(doc(json!({"name": "Outro"}))).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_update_does_not_notify() {
        let store = open(Arc::new(MemoryStorage::new()));
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let _sub = store.subscribe(CHANGE_EVENT, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(store.update("missing", &json!({})).is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handler_can_read_store() {
        let store = Arc::new(open(Arc::new(MemoryStorage::new())));
        let seen = Arc::new(AtomicUsize::new(0));

        let reader = Arc::downgrade(&store);
        let seen_in_handler = Arc::clone(&seen);
        let _sub = store.subscribe(CHANGE_EVENT, move |_| {
            if let Some(store) = reader.upgrade() {
                seen_in_handler.store(store.len(), Ordering::SeqCst);
            }
        });

        store.create(doc(json!({"name": "Novo"}))).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_watch_receives_changes() {
        let store = open(Arc::new(MemoryStorage::new()));
        let stream = store.watch();

        let created = store.create(doc(json!({"name": "Novo"}))).unwrap();
        store.update("c2", &json!({"order": 0})).unwrap();

        let events = stream.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, ChangeKind::Created);
        assert_eq!(Some(events[0].record_id.as_str()), created.id());
        assert_eq!(events[1].kind, ChangeKind::Updated);
        assert_eq!(events[1].record_id, "c2");
    }

    #[test]
    fn test_unreachable_backend_degrades_to_memory() {
        let store = open(Arc::new(FailingStorage));
        assert!(store.is_degraded());
        assert_eq!(store.list(&Query::new()), seed());

        let created = store.create(doc(json!({"name": "Offline"}))).unwrap();
        assert!(store.find_by_id(created.id().unwrap()).is_some());
    }

    #[test]
    fn test_save_failure_mid_session_degrades_and_keeps_records() {
        // seed save and the first create succeed, the second create hits the failure
        let storage = Arc::new(SavesThenFails::new(2));
        let store = open(storage.clone());
        assert!(!store.is_degraded());

        let first = store.create(doc(json!({"name": "Persisted"}))).unwrap();
        assert!(!store.is_degraded());

        let second = store.create(doc(json!({"name": "Memory only"}))).unwrap();
        assert!(store.is_degraded());
        assert_eq!(storage.saves.load(Ordering::SeqCst), 3);

        let third = store.create(doc(json!({"name": "Skipped"}))).unwrap();
        store.update("c1", &json!({"order": 9})).unwrap();
        assert_eq!(storage.saves.load(Ordering::SeqCst), 3);

        for created in [&first, &second, &third] {
            assert_eq!(store.find_by_id(created.id().unwrap()).as_ref(), Some(created));
        }
        assert_eq!(store.find_by_id("c1").unwrap().get("order"), Some(&json!(9)));
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn test_seed_is_copied() {
        let original = seed();
        let store = EntityStore::open("copy", &original, Arc::new(MemoryStorage::new())).unwrap();
        store.update("c1", &json!({"name": "Mudou"})).unwrap();

        assert_eq!(original[0].get("name"), Some(&json!("Projetos")));
    }

    #[test]
    fn test_open_rejects_invalid_key() {
        let err = EntityStore::<Document>::open("bad key", &[], Arc::new(MemoryStorage::new()))
            .unwrap_err();
        assert!(matches!(err, StoreError::Storage(StorageError::InvalidKey(_))));
    }
}
