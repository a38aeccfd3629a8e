//! Single-file JSON store for desktop hosts.
//!
//! The whole key space lives in one JSON object. Every write rewrites the
//! file through a temp file + rename so a crash never leaves half a file.

use super::{KeyValueStore, PersistenceError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Default location: `<config dir>/locam/storage.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("locam")
            .join("storage.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>, PersistenceError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if bytes.is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(PersistenceError::Unavailable(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
            Err(source) => Err(PersistenceError::Malformed {
                key: self.path.display().to_string(),
                source,
            }),
        }
    }

    async fn write_all(&self, map: Map<String, Value>) -> Result<(), PersistenceError> {
        let io_err = |source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let bytes = serde_json::to_vec_pretty(&Value::Object(map)).map_err(|source| {
            PersistenceError::Serialize {
                key: self.path.display().to_string(),
                source,
            }
        })?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;

        log::debug!("[STORE] Wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_all().await?;
        map.insert(key.to_string(), value);
        self.write_all(map).await
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_all().await?;
        if map.remove(key).is_some() {
            self.write_all(map).await?;
        }
        Ok(())
    }
}
