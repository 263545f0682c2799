//! Change event types delivered to subscribers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the only event a store fires.
pub const CHANGE_EVENT: &str = "change";

/// Unique identifier for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new random subscription id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which mutation produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A record was appended by `create`.
    Created,
    /// A record was merged by `update`.
    Updated,
}

/// Payload handed to change handlers and streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Storage key of the collection that changed.
    pub storage_key: String,
    /// Mutation kind.
    pub kind: ChangeKind,
    /// Id of the created or updated record.
    pub record_id: String,
    /// When the mutation was applied.
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub(crate) fn new(storage_key: &str, kind: ChangeKind, record_id: &str) -> Self {
        Self {
            storage_key: storage_key.to_string(),
            kind,
            record_id: record_id.to_string(),
            at: Utc::now(),
        }
    }
}
