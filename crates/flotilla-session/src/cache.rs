//! Self-healing typed cache over [`SessionStorage`].
use std::path::PathBuf;
use std::sync::Arc;

use flotilla_api::{ActiveTeam, UserProfile};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::storage::{FileStorage, MemoryStorage, SessionStorage};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const ACTIVE_TEAM_KEY: &str = "activeTeam";

/// Shape check applied after a cached value decodes.
pub trait CachedValue {
    fn is_well_formed(&self) -> bool {
        true
    }
}

impl CachedValue for String {
    fn is_well_formed(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl CachedValue for ActiveTeam {
    fn is_well_formed(&self) -> bool {
        ActiveTeam::is_well_formed(self)
    }
}

impl CachedValue for UserProfile {}

impl CachedValue for serde_json::Value {}

#[derive(Clone)]
/// JSON-encoded values keyed by name. Reads never surface a corrupt value:
/// anything that fails to decode or validate is removed and reported absent.
pub struct PersistentCache {
    storage: Arc<dyn SessionStorage>,
}

impl std::fmt::Debug for PersistentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentCache").finish_non_exhaustive()
    }
}

impl PersistentCache {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn file(root: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStorage::new(root)))
    }

    fn fetch(&self, key: &str) -> Option<String> {
        match self.storage.get_item(key) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(key, error = %error, "session cache read failed");
                None
            }
        }
    }

    pub fn read<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned + CachedValue,
    {
        let raw = self.fetch(key)?;
        match serde_json::from_str::<T>(&raw) {
            Ok(value) if value.is_well_formed() => Some(value),
            Ok(_) => {
                tracing::debug!(key, "purging ill-formed session cache entry");
                self.remove(key);
                None
            }
            Err(error) => {
                tracing::debug!(key, error = %error, "purging undecodable session cache entry");
                self.remove(key);
                None
            }
        }
    }

    /// Stored text without JSON decoding, trimmed. Blank entries are purged.
    pub fn read_raw_string(&self, key: &str) -> Option<String> {
        let raw = self.fetch(key)?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            tracing::debug!(key, "purging blank session cache entry");
            self.remove(key);
            return None;
        }
        Some(trimmed.to_string())
    }

    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(error) => {
                tracing::warn!(key, error = %error, "failed to encode session cache value");
                return;
            }
        };
        if let Err(error) = self.storage.set_item(key, &encoded) {
            tracing::warn!(key, error = %error, "session cache write failed");
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(error) = self.storage.remove_item(key) {
            tracing::warn!(key, error = %error, "session cache remove failed");
        }
    }

    /// True when the key holds any raw value, decodable or not.
    pub fn contains(&self, key: &str) -> bool {
        matches!(self.storage.get_item(key), Ok(Some(_)))
    }
}

#[derive(Clone, Debug)]
/// Capability declared by the hosting environment. Without durable storage
/// nothing is cached and the auth guard does not run.
pub enum Persistence {
    Available(PersistentCache),
    Unavailable,
}

impl Persistence {
    pub fn in_memory() -> Self {
        Self::Available(PersistentCache::in_memory())
    }

    pub fn file(root: impl Into<PathBuf>) -> Self {
        Self::Available(PersistentCache::file(root))
    }

    pub fn cache(&self) -> Option<&PersistentCache> {
        match self {
            Self::Available(cache) => Some(cache),
            Self::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}
