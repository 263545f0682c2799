//! Store configuration.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::storage::{FileStorage, MemoryStorage, Storage};
use crate::store::{StoreRegistry, DEFAULT_STREAM_CAPACITY};

/// Environment variable selecting the file backend directory.
pub const ENV_STORE_DIR: &str = "PORTAL_STORE_DIR";
/// Environment variable overriding the change stream capacity.
pub const ENV_STREAM_CAPACITY: &str = "PORTAL_STREAM_CAPACITY";

/// Where collections are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Backend {
    /// Process memory only.
    #[default]
    Memory,
    /// One JSON file per storage key under `dir`.
    File {
        /// Directory holding the slot files.
        dir: PathBuf,
    },
}

/// Configuration for opening a [`StoreRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Persistence backend.
    pub backend: Backend,
    /// Per-stream buffer capacity for `watch()`.
    pub stream_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            stream_capacity: DEFAULT_STREAM_CAPACITY,
        }
    }
}

impl StoreConfig {
    const MAX_STREAM_CAPACITY: usize = 1 << 20;

    /// File backend rooted at `dir`, other settings default.
    #[must_use]
    pub fn file(dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::File { dir: dir.into() },
            ..Self::default()
        }
    }

    /// Read configuration from `PORTAL_STORE_DIR` and
    /// `PORTAL_STREAM_CAPACITY`. Unset variables keep their defaults.
    ///
    /// # Errors
    /// `Config` if `PORTAL_STREAM_CAPACITY` is not a positive integer.
    pub fn from_env() -> StoreResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> StoreResult<Self> {
        let mut cfg = Self::default();

        if let Some(dir) = lookup(ENV_STORE_DIR).filter(|d| !d.trim().is_empty()) {
            cfg.backend = Backend::File {
                dir: PathBuf::from(dir.trim()),
            };
        }

        if let Some(raw) = lookup(ENV_STREAM_CAPACITY) {
            cfg.stream_capacity = raw.trim().parse().map_err(|_| StoreError::Config {
                reason: format!("{ENV_STREAM_CAPACITY} must be a positive integer (got '{raw}')"),
            })?;
        }

        cfg.validate()
    }

    /// Check value ranges.
    ///
    /// # Errors
    /// `Config` if the stream capacity is zero or above 1Mi, or the file
    /// backend directory is empty.
    pub fn validate(self) -> StoreResult<Self> {
        if self.stream_capacity == 0 || self.stream_capacity > Self::MAX_STREAM_CAPACITY {
            return Err(StoreError::Config {
                reason: format!(
                    "stream_capacity must be between 1 and {} (got {})",
                    Self::MAX_STREAM_CAPACITY,
                    self.stream_capacity
                ),
            });
        }

        if let Backend::File { dir } = &self.backend {
            if dir.as_os_str().is_empty() {
                return Err(StoreError::Config {
                    reason: "file backend directory cannot be empty".to_string(),
                });
            }
        }

        Ok(self)
    }
}

/// Open a store registry for the given configuration.
///
/// # Errors
/// - `Config` if the configuration is invalid
/// - `Storage` if the file backend directory cannot be created
///
/// # Example
/// ```rust,ignore
/// use portal_store::{open_registry, StoreConfig};
///
/// let registry = open_registry(StoreConfig::file("./portal-data"))?;
/// let topics = portal_store::entities::ForumTopics::open(&registry)?;
/// ```
pub fn open_registry(config: StoreConfig) -> StoreResult<StoreRegistry> {
    let cfg = config.validate()?;
    let storage: Arc<dyn Storage> = match &cfg.backend {
        Backend::Memory => Arc::new(MemoryStorage::new()),
        Backend::File { dir } => Arc::new(FileStorage::open(dir)?),
    };
    Ok(StoreRegistry::with_stream_capacity(storage, cfg.stream_capacity))
}
