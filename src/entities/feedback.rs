//! Feedback left by interns and mentors.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::notify::{ChangeEvent, Subscription};
use crate::query::{Criteria, Query};
use crate::record::Record;
use crate::store::{EntityStore, StoreRegistry};

/// One feedback submission.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feedback {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub author_name: String,
    pub author_email: String,
    /// 1 to 5; not enforced by the store.
    pub rating: u8,
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
}

impl Feedback {
    /// New unsaved feedback.
    #[must_use]
    pub fn new(author_email: impl Into<String>, rating: u8, message: impl Into<String>) -> Self {
        Self {
            author_email: author_email.into(),
            rating,
            message: message.into(),
            ..Self::default()
        }
    }
}

impl Record for Feedback {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn on_create(&mut self, now: DateTime<Utc>) {
        self.created_date.get_or_insert(now);
    }
}

/// Feedback collection: list, filter, create and subscribe.
#[derive(Debug, Clone)]
pub struct FeedbackEntries {
    store: Arc<EntityStore<Feedback>>,
}

#[allow(missing_docs)]
impl FeedbackEntries {
    /// Storage key of the collection.
    pub const STORAGE_KEY: &'static str = "feedback";

    /// Bind to the registry's feedback store. The collection starts empty.
    pub fn open(registry: &StoreRegistry) -> StoreResult<Self> {
        Ok(Self {
            store: registry.store(Self::STORAGE_KEY, &[])?,
        })
    }

    pub fn list(&self, query: &Query) -> Vec<Feedback> {
        self.store.list(query)
    }

    pub fn filter(&self, criteria: &Criteria, query: &Query) -> Vec<Feedback> {
        self.store.filter(criteria, query)
    }

    pub fn create(&self, feedback: Feedback) -> StoreResult<Feedback> {
        self.store.create(feedback)
    }

    pub fn subscribe<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.store.subscribe(event, handler)
    }
}
