//! Abstract storage trait for portal-store.
//!
//! A backend exposes one durable key/value slot per storage key. The value
//! is the serialized collection (a JSON array of records); backends never
//! look inside it. By using a trait, we enable:
//! - In-memory backends for testing and embedded use
//! - File backends for durable local persistence

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage key contains characters the backend cannot address.
    #[error("Invalid storage key: '{0}'")]
    InvalidKey(String),

    /// Filesystem failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The slot exists but does not hold a readable collection.
    #[error("Corrupt slot '{key}': {reason}")]
    Corrupt {
        /// Storage key of the slot.
        key: String,
        /// Parse failure description.
        reason: String,
    },

    /// Backend error.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Durable key/value slots holding serialized collections.
///
/// # Semantics
/// - `save` is a full overwrite of the slot, never an append
/// - `load` returns `Ok(None)` for a slot that was never written
/// - Backends must be safe to share across threads
pub trait Storage: Send + Sync + fmt::Debug {
    /// Read the raw value stored under `key`.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Short backend name used in logs.
    fn name(&self) -> &'static str;
}

/// Check that `key` is usable as a storage key on every backend.
///
/// Keys are restricted to ASCII letters, digits, `_`, `-` and `.`, must be
/// non-empty and must not start with a dot.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_portal_keys() {
        for key in ["feedback", "forum_topics", "forum-replies.v2", "K9"] {
            assert!(validate_key(key).is_ok(), "{key} should be valid");
        }
    }

    #[test]
    fn test_validate_key_rejects_paths() {
        for key in ["", ".hidden", "../escape", "a/b", "with space", "ação"] {
            assert!(
                matches!(validate_key(key), Err(StorageError::InvalidKey(_))),
                "{key} should be rejected"
            );
        }
    }
}
