//! Gallery store: captured stills persisted under `capturedImages`.
//!
//! The in-memory list is authoritative for the session. Every mutation is
//! followed by a full rewrite of the persisted list; a failed write is
//! logged and never rolls the in-memory list back.

use crate::storage::{keys, load_json, save_json, KeyValueStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: String,
    /// `data:image/png;base64,...`
    pub image: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl GalleryItem {
    /// New item whose id is derived from the capture time.
    pub fn captured_at(image: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: timestamp.timestamp_millis().to_string(),
            image,
            timestamp,
        }
    }
}

pub struct GalleryStore {
    store: Arc<dyn KeyValueStore>,
    items: Vec<GalleryItem>,
}

impl GalleryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            items: Vec::new(),
        }
    }

    /// Replace the in-memory list with the persisted one.
    ///
    /// Absent, unreadable or malformed data all yield an empty gallery.
    pub async fn load(&mut self) -> &[GalleryItem] {
        self.items = match load_json::<Vec<GalleryItem>>(self.store.as_ref(), keys::CAPTURED_IMAGES).await {
            Ok(Some(items)) => items,
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("[GALLERY] Load failed, starting empty: {}", e);
                Vec::new()
            }
        };
        log::debug!("[GALLERY] Loaded {} items", self.items.len());
        &self.items
    }

    /// Re-read the persisted list while the session is running.
    ///
    /// Unlike [`load`](Self::load), a failed read keeps the in-memory list:
    /// the next write would otherwise replace the stored captures with it.
    pub async fn reload(&mut self) -> &[GalleryItem] {
        match load_json::<Vec<GalleryItem>>(self.store.as_ref(), keys::CAPTURED_IMAGES).await {
            Ok(items) => self.items = items.unwrap_or_default(),
            Err(e) => log::warn!(
                "[GALLERY] Reload failed, keeping {} items in memory: {}",
                self.items.len(),
                e
            ),
        }
        &self.items
    }

    /// Append `item` and return its id. A colliding id gets a numeric suffix.
    pub async fn add(&mut self, mut item: GalleryItem) -> String {
        if self.contains(&item.id) {
            let base = item.id.clone();
            let mut n = 1;
            while self.contains(&format!("{}-{}", base, n)) {
                n += 1;
            }
            item.id = format!("{}-{}", base, n);
        }
        let id = item.id.clone();
        self.items.push(item);
        log::info!("[GALLERY] Added {} ({} items)", id, self.items.len());
        self.persist().await;
        id
    }

    /// Remove the item with `id`. Returns whether anything was removed.
    pub async fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        let removed = self.items.len() != before;
        if removed {
            log::info!("[GALLERY] Removed {}", id);
        }
        self.persist().await;
        removed
    }

    pub async fn clear(&mut self) {
        log::info!("[GALLERY] Cleared {} items", self.items.len());
        self.items.clear();
        self.persist().await;
    }

    /// Insertion order.
    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    /// Display order: most recent first.
    pub fn newest_first(&self) -> impl Iterator<Item = &GalleryItem> {
        self.items.iter().rev()
    }

    pub fn get(&self, id: &str) -> Option<&GalleryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    async fn persist(&self) {
        if let Err(e) = save_json(self.store.as_ref(), keys::CAPTURED_IMAGES, &self.items).await {
            log::error!("[GALLERY] Persist failed, keeping in-memory list: {}", e);
        }
    }
}
