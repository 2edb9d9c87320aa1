//! Persistent key-value store for pages, bounds, settings and permissions.
//!
//! ## Architecture
//!
//! ```text
//! mod.rs (Store: cached primitive get/set/delete)
//!   |
//!   +-- backend.rs (StoreBackend trait, tauri-plugin-store and memory backends)
//!   +-- schema.rs  (domain accessors layered on the primitive API)
//!   +-- tests.rs   (unit tests)
//! ```
//!
//! Every `set` updates the cache before touching the backend, so reads in
//! the same tick observe the write even when the disk flush lags behind.
//! Values cross the boundary as owned `serde_json::Value`s: a caller can
//! never hold a reference into the cache.

pub mod backend;
pub mod schema;
#[cfg(test)]
mod tests;

pub use backend::{MemoryBackend, StoreBackend, TauriStoreBackend};
pub use schema::{PermissionMap, StoredPage};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::WebTrayResult;

/// File name used by the tauri-plugin-store backend.
pub const STORE_FILE: &str = "webtray.json";

/// Cached store over a [`StoreBackend`].
pub struct Store {
    backend: Box<dyn StoreBackend>,
    /// `None` entries record a confirmed miss so the backend is not asked again.
    cache: Mutex<HashMap<String, Option<Value>>>,
}

impl Store {
    pub fn new(backend: Box<dyn StoreBackend>) -> Self {
        Self {
            backend,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// In-memory store, used by tests and as a fallback when no app handle exists.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::default()))
    }

    /// Read a value, falling back to `default` when the key is absent.
    pub fn get(&self, key: &str, default: Value) -> Value {
        self.get_raw(key).unwrap_or(default)
    }

    /// Read a value if present.
    pub fn get_raw(&self, key: &str) -> Option<Value> {
        let mut cache = self.cache.lock();
        if let Some(entry) = cache.get(key) {
            return entry.clone();
        }
        let loaded = self.backend.load(key);
        cache.insert(key.to_string(), loaded.clone());
        loaded
    }

    /// Read and deserialize a value. Malformed values are treated as absent.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get_raw(key)?;
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                log::warn!("[STORE] Ignoring malformed value for '{}': {}", key, e);
                None
            },
        }
    }

    /// Write a value. The cache is updated before the backend write.
    pub fn set(&self, key: &str, value: Value) -> WebTrayResult<()> {
        self.cache
            .lock()
            .insert(key.to_string(), Some(value.clone()));
        self.backend.save(key, value)
    }

    /// Serialize and write a value.
    pub fn set_as<T: Serialize>(&self, key: &str, value: &T) -> WebTrayResult<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, value)
    }

    /// Remove a key.
    pub fn delete(&self, key: &str) -> WebTrayResult<()> {
        self.cache.lock().insert(key.to_string(), None);
        self.backend.remove(key)
    }

    /// All keys currently known to the backend or written through the cache.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = self.backend.keys();
        for (key, value) in self.cache.lock().iter() {
            match value {
                Some(_) if !keys.contains(key) => keys.push(key.clone()),
                None => keys.retain(|k| k != key),
                _ => {},
            }
        }
        keys
    }
}
