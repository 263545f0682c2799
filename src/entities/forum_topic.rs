//! Forum topics.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::notify::{ChangeEvent, Subscription};
use crate::query::{Criteria, Query};
use crate::record::Record;
use crate::store::{EntityStore, StoreRegistry};

/// A discussion thread inside a category.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForumTopic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub category_id: String,
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub author_email: String,
    pub is_pinned: bool,
    pub replies_count: u32,
    pub views: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reply_date: Option<DateTime<Utc>>,
}

impl ForumTopic {
    /// New unsaved topic in `category_id`.
    #[must_use]
    pub fn new(
        category_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            category_id: category_id.into(),
            title: title.into(),
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

impl Record for ForumTopic {
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

/// Welcome threads present on a fresh install.
#[must_use]
pub fn seed() -> Vec<ForumTopic> {
    let posted = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single();
    vec![
        ForumTopic {
            id: Some("welcome".to_string()),
            category_id: "general".to_string(),
            title: "Boas-vindas ao fórum dos estagiários!".to_string(),
            content: "Use este espaço para tirar dúvidas, compartilhar aprendizados e \
                      conhecer a turma. Leia as regras de convivência antes de postar."
                .to_string(),
            author_name: "Equipe do Programa".to_string(),
            author_email: "programa@portal.local".to_string(),
            is_pinned: true,
            replies_count: 1,
            views: 0,
            created_date: posted,
            last_reply_date: Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).single(),
        },
        ForumTopic {
            id: Some("mentoring-intro".to_string()),
            category_id: "career".to_string(),
            title: "Como aproveitar melhor a mentoria".to_string(),
            content: "Dicas para preparar os encontros com seu padrinho ou madrinha."
                .to_string(),
            author_name: "Equipe do Programa".to_string(),
            author_email: "programa@portal.local".to_string(),
            is_pinned: false,
            replies_count: 0,
            views: 0,
            created_date: Utc.with_ymd_and_hms(2024, 3, 4, 14, 0, 0).single(),
            last_reply_date: None,
        },
    ]
}

/// Topic collection: list, filter, get, create, update and subscribe.
#[derive(Debug, Clone)]
pub struct ForumTopics {
    store: Arc<EntityStore<ForumTopic>>,
}

#[allow(missing_docs)]
impl ForumTopics {
    pub const STORAGE_KEY: &'static str = "forum_topics";

    /// Bind to the registry's topic store, seeding it on first use.
    pub fn open(registry: &StoreRegistry) -> StoreResult<Self> {
        Ok(Self {
            store: registry.store(Self::STORAGE_KEY, &seed())?,
        })
    }

    pub fn list(&self, query: &Query) -> Vec<ForumTopic> {
        self.store.list(query)
    }

    pub fn filter(&self, criteria: &Criteria, query: &Query) -> Vec<ForumTopic> {
        self.store.filter(criteria, query)
    }

    pub fn get(&self, id: &str) -> Option<ForumTopic> {
        self.store.find_by_id(id)
    }

    pub fn create(&self, topic: ForumTopic) -> StoreResult<ForumTopic> {
        self.store.create(topic)
    }

    /// Shallow-merge `updates` (any object-shaped value) into topic `id`.
    pub fn update<P: Serialize + ?Sized>(&self, id: &str, updates: &P) -> StoreResult<ForumTopic> {
        self.store.update(id, updates)
    }

    pub fn subscribe<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.store.subscribe(event, handler)
    }
}
