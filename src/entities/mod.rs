//! Domain facades over entity stores.
//!
//! Each facade binds one store to one storage key and seed dataset and
//! exposes only the operations its domain uses. Field contents are not
//! validated here; that is left to callers.

mod feedback;
mod forum_category;
mod forum_reply;
mod forum_topic;

pub use feedback::{Feedback, FeedbackEntries};
pub use forum_category::{ForumCategories, ForumCategory};
pub use forum_reply::{ForumReplies, ForumReply};
pub use forum_topic::{ForumTopic, ForumTopics};

/// Seed datasets, exposed for tests and tooling.
pub mod seeds {
    pub use super::forum_category::seed as forum_categories;
    pub use super::forum_reply::seed as forum_replies;
    pub use super::forum_topic::seed as forum_topics;
}

use crate::error::StoreResult;
use crate::store::StoreRegistry;

/// Every portal facade bound to one registry.
#[derive(Debug, Clone)]
pub struct Portal {
    /// Feedback submissions.
    pub feedback: FeedbackEntries,
    /// Forum categories.
    pub categories: ForumCategories,
    /// Forum topics.
    pub topics: ForumTopics,
    /// Forum replies.
    pub replies: ForumReplies,
}

impl Portal {
    /// Open all facades, seeding collections that were never written.
    pub fn open(registry: &StoreRegistry) -> StoreResult<Self> {
        Ok(Self {
            feedback: FeedbackEntries::open(registry)?,
            categories: ForumCategories::open(registry)?,
            topics: ForumTopics::open(registry)?,
            replies: ForumReplies::open(registry)?,
        })
    }
}
