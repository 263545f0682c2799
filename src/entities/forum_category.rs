//! Forum categories.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::query::{Criteria, Query};
use crate::record::Record;
use crate::store::{EntityStore, StoreRegistry};

/// A forum section topics are filed under.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForumCategory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    /// Icon name understood by the UI.
    pub icon: String,
    /// Tailwind color token.
    pub color: String,
    /// Display position, ascending.
    pub order: u32,
}

impl Record for ForumCategory {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

fn category(
    id: &str,
    name: &str,
    description: &str,
    icon: &str,
    color: &str,
    order: u32,
) -> ForumCategory {
    ForumCategory {
        id: Some(id.to_string()),
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
        order,
    }
}

/// Built-in categories the forum ships with.
#[must_use]
pub fn seed() -> Vec<ForumCategory> {
    vec![
        category(
            "general",
            "Dúvidas Gerais",
            "Perguntas sobre o dia a dia do estágio",
            "HelpCircle",
            "blue",
            1,
        ),
        category(
            "projects",
            "Projetos",
            "Troca de ideias sobre os projetos em andamento",
            "FolderKanban",
            "purple",
            2,
        ),
        category(
            "career",
            "Carreira",
            "Desenvolvimento profissional, cursos e mentoria",
            "GraduationCap",
            "green",
            3,
        ),
        category(
            "events",
            "Eventos",
            "Encontros, workshops e confraternizações",
            "CalendarDays",
            "orange",
            4,
        ),
    ]
}

/// Read-only view of the categories: list, filter and get.
#[derive(Debug, Clone)]
pub struct ForumCategories {
    store: Arc<EntityStore<ForumCategory>>,
}

#[allow(missing_docs)]
impl ForumCategories {
    /// Storage key of the collection.
    pub const STORAGE_KEY: &'static str = "forum_categories";

    /// Bind to the registry's category store, seeding it on first use.
    pub fn open(registry: &StoreRegistry) -> StoreResult<Self> {
        Ok(Self {
            store: registry.store(Self::STORAGE_KEY, &seed())?,
        })
    }

    pub fn list(&self, query: &Query) -> Vec<ForumCategory> {
        self.store.list(query)
    }

    pub fn filter(&self, criteria: &Criteria, query: &Query) -> Vec<ForumCategory> {
        self.store.filter(criteria, query)
    }

    pub fn get(&self, id: &str) -> Option<ForumCategory> {
        self.store.find_by_id(id)
    }
}
