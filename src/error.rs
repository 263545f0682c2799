//! Error types for portal-store.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! specific conditions (for example a missing record on `update`) instead
//! of parsing messages.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors raised by entity stores, the registry and configuration.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The targeted record does not exist in the collection.
    #[error("Record not found: {storage_key}/{id}")]
    NotFound {
        /// Storage key of the collection.
        storage_key: String,
        /// Requested record id.
        id: String,
    },

    /// A record with the same id is already stored.
    #[error("Duplicate record id: {storage_key}/{id}")]
    DuplicateId {
        /// Storage key of the collection.
        storage_key: String,
        /// Colliding record id.
        id: String,
    },

    /// The update payload was not a field/value mapping.
    #[error("Update payload must be a JSON object, got {kind}")]
    InvalidPatch {
        /// JSON kind of the rejected payload.
        kind: &'static str,
    },

    /// A record could not be converted to or from its JSON form.
    #[error("Record serialization error: {message}")]
    Serialization {
        /// Underlying serde message.
        message: String,
    },

    /// A storage key was requested with a record type other than the one
    /// it was first opened with.
    #[error("Store '{storage_key}' is already open with record type {existing}")]
    TypeMismatch {
        /// Storage key of the collection.
        storage_key: String,
        /// Type name the store was opened with.
        existing: &'static str,
    },

    /// Storage backend failure surfaced to the caller.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid configuration value.
    #[error("Invalid configuration: {reason}")]
    Config {
        /// What was wrong.
        reason: String,
    },

    /// Internal invariant violation (poisoned lock and similar).
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl StoreError {
    /// Returns true if this is a [`StoreError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn poisoned(context: &'static str) -> Self {
        Self::Internal {
            message: format!("poisoned lock: {context}"),
        }
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
