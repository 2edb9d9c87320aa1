//! Storage backends.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tauri::{AppHandle, Runtime};
use tauri_plugin_store::StoreExt;

use super::STORE_FILE;
use crate::error::{WebTrayError, WebTrayResult};

/// Raw key-value persistence used by [`super::Store`].
pub trait StoreBackend: Send + Sync {
    fn load(&self, key: &str) -> Option<Value>;
    fn save(&self, key: &str, value: Value) -> WebTrayResult<()>;
    fn remove(&self, key: &str) -> WebTrayResult<()>;
    fn keys(&self) -> Vec<String>;
}

// ============================================================================
// tauri-plugin-store
// ============================================================================

/// Backend persisting to `webtray.json` in the app data directory.
pub struct TauriStoreBackend<R: Runtime> {
    store: Arc<tauri_plugin_store::Store<R>>,
}

impl<R: Runtime> TauriStoreBackend<R> {
    /// Open (or create) the store file. Failure here is fatal for startup.
    pub fn open(app: &AppHandle<R>) -> WebTrayResult<Self> {
        let store = app
            .store(STORE_FILE)
            .map_err(|e| WebTrayError::StorageError(format!("Failed to open store: {}", e)))?;
        log::info!("[STORE] Opened {} with {} keys", STORE_FILE, store.keys().len());
        Ok(Self { store })
    }

    fn flush(&self) -> WebTrayResult<()> {
        self.store
            .save()
            .map_err(|e| WebTrayError::StorageError(format!("Failed to save store: {}", e)))
    }
}

impl<R: Runtime> StoreBackend for TauriStoreBackend<R> {
    fn load(&self, key: &str) -> Option<Value> {
        self.store.get(key)
    }

    fn save(&self, key: &str, value: Value) -> WebTrayResult<()> {
        self.store.set(key, value);
        self.flush()
    }

    fn remove(&self, key: &str) -> WebTrayResult<()> {
        if self.store.delete(key) {
            self.flush()?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.store.keys()
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Volatile backend. Test builds also count writes.
#[derive(Default)]
pub struct MemoryBackend {
    values: Mutex<HashMap<String, Value>>,
    #[cfg(test)]
    writes: Mutex<usize>,
}

#[cfg(test)]
impl MemoryBackend {
    pub fn with_values(values: HashMap<String, Value>) -> Self {
        Self {
            values: Mutex::new(values),
            writes: Mutex::new(0),
        }
    }

    pub fn write_count(&self) -> usize {
        *self.writes.lock()
    }
}

impl StoreBackend for MemoryBackend {
    fn load(&self, key: &str) -> Option<Value> {
        self.values.lock().get(key).cloned()
    }

    fn save(&self, key: &str, value: Value) -> WebTrayResult<()> {
        self.values.lock().insert(key.to_string(), value);
        #[cfg(test)]
        {
            *self.writes.lock() += 1;
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> WebTrayResult<()> {
        self.values.lock().remove(key);
        #[cfg(test)]
        {
            *self.writes.lock() += 1;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.values.lock().keys().cloned().collect()
    }
}

impl<T: StoreBackend + ?Sized> StoreBackend for Arc<T> {
    fn load(&self, key: &str) -> Option<Value> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: Value) -> WebTrayResult<()> {
        (**self).save(key, value)
    }

    fn remove(&self, key: &str) -> WebTrayResult<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> Vec<String> {
        (**self).keys()
    }
}
