//! Persistence capability: a small JSON key/value store.
//!
//! Mirrors the extension's local storage area: values are JSON, writes
//! replace the whole value for a key. Two backends ship here: an in-memory
//! store and a single-file store for desktop hosts.

mod file;

pub use file::JsonFileStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Well-known keys.
pub mod keys {
    pub const THEME: &str = "theme";
    pub const CAMERA_PERMISSION_GRANTED: &str = "cameraPermissionGranted";
    pub const CAPTURED_IMAGES: &str = "capturedImages";
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), PersistenceError>;
    async fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Storage I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored value for '{key}' is malformed: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize value for '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Read `key` and deserialize it. Absent keys are `Ok(None)`.
pub async fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, PersistenceError> {
    match store.get(key).await? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| PersistenceError::Malformed {
                key: key.to_string(),
                source,
            }),
    }
}

/// Serialize `value` and write it under `key`.
pub async fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), PersistenceError> {
    let value = serde_json::to_value(value).map_err(|source| PersistenceError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.set(key, value).await
}

/// Volatile store, used by tests and hosts without a storage area.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Value>>, PersistenceError> {
        self.entries
            .lock()
            .map_err(|e| PersistenceError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        Ok(self.entries()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), PersistenceError> {
        self.entries()?.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.entries()?.remove(key);
        Ok(())
    }
}
