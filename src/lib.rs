//! # portal-store
//!
//! Persistence and notification layer for an intern portal, plus the
//! portal's bilingual FAQ responder.
//!
//! ## Core Concepts
//!
//! - **EntityStore**: a named collection of records persisted as one JSON
//!   slot, seeded on first use, with list/filter/find/create/update and
//!   change subscriptions
//! - **StoreRegistry**: owns the storage backend and hands out one store
//!   per storage key
//! - **Facades**: `Feedback`, `ForumCategory`, `ForumTopic` and
//!   `ForumReply` collections exposing only the operations each one needs
//! - **FAQ**: keyword-scored answers over a static pt/en knowledge base
//!
//! ## Usage
//!
//! ```
//! use portal_store::{open_registry, Portal, Query, StoreConfig};
//!
//! let registry = open_registry(StoreConfig::default())?;
//! let portal = Portal::open(&registry)?;
//!
//! let categories = portal.categories.list(&Query::new().sort("order"));
//! assert_eq!(categories[0].id.as_deref(), Some("general"));
//! # Ok::<(), portal_store::StoreError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod entities;
pub mod error;
pub mod faq;
pub mod notify;
pub mod query;
pub mod record;
pub mod storage;
pub mod store;

pub use config::{open_registry, Backend, StoreConfig};
pub use entities::{
    Feedback, FeedbackEntries, ForumCategories, ForumCategory, ForumReplies, ForumReply,
    ForumTopic, ForumTopics, Portal,
};
pub use error::{StoreError, StoreResult};
pub use faq::{FaqError, FaqRequest, FaqResponder, KnowledgeBase, Language};
pub use notify::{
    ChangeEvent, ChangeKind, ChangeStream, Subscription, SubscriptionId, CHANGE_EVENT,
};
pub use query::{Criteria, Query, SortDirective};
pub use record::{Document, Record};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use store::{EntityStore, StoreRegistry};
