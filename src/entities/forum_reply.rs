//! Replies posted on forum topics.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::notify::{ChangeEvent, Subscription};
use crate::query::{Criteria, Query};
use crate::record::Record;
use crate::store::{EntityStore, StoreRegistry};

/// A reply on a topic.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForumReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub topic_id: String,
    pub content: String,
    pub author_name: String,
    pub author_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
}

impl ForumReply {
    /// New unsaved reply on `topic_id`.
    #[must_use]
    pub fn new(topic_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            topic_id: topic_id.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Set the author fields.
    #[must_use]
    pub fn by(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.author_name = name.into();
        self.author_email = email.into();
        self
    }
}

impl Record for ForumReply {
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

/// Reply on the welcome topic.
#[must_use]
pub fn seed() -> Vec<ForumReply> {
    vec![ForumReply {
        id: Some("welcome-reply".to_string()),
        topic_id: "welcome".to_string(),
        content: "Qualquer dúvida sobre o portal, é só perguntar por aqui.".to_string(),
        author_name: "Equipe do Programa".to_string(),
        author_email: "programa@portal.local".to_string(),
        created_date: Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).single(),
    }]
}

/// Reply collection: list, filter, create and subscribe.
#[derive(Debug, Clone)]
pub struct ForumReplies {
    store: Arc<EntityStore<ForumReply>>,
}

#[allow(missing_docs)]
impl ForumReplies {
    pub const STORAGE_KEY: &'static str = "forum_replies";

    pub fn open(registry: &StoreRegistry) -> StoreResult<Self> {
        Ok(Self {
            store: registry.store(Self::STORAGE_KEY, &seed())?,
        })
    }

    pub fn list(&self, query: &Query) -> Vec<ForumReply> {
        self.store.list(query)
    }

    pub fn filter(&self, criteria: &Criteria, query: &Query) -> Vec<ForumReply> {
        self.store.filter(criteria, query)
    }

    pub fn create(&self, reply: ForumReply) -> StoreResult<ForumReply> {
        self.store.create(reply)
    }

    pub fn subscribe<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.store.subscribe(event, handler)
    }
}
