//! Light/dark theme preference, persisted under `theme`.

use crate::storage::{keys, load_json, save_json, KeyValueStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

pub struct ThemeManager {
    store: Arc<dyn KeyValueStore>,
    current: Theme,
}

impl ThemeManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            current: Theme::default(),
        }
    }

    /// Load the saved theme. Anything unreadable falls back to light.
    pub async fn load(&mut self) -> Theme {
        self.current = match load_json::<Theme>(self.store.as_ref(), keys::THEME).await {
            Ok(theme) => theme.unwrap_or_default(),
            Err(e) => {
                log::warn!("[THEME] Failed to load theme, using default: {}", e);
                Theme::default()
            }
        };
        self.current
    }

    /// Flip the theme and persist it. A failed write keeps the new theme.
    pub async fn toggle(&mut self) -> Theme {
        self.current = self.current.toggled();
        if let Err(e) = save_json(self.store.as_ref(), keys::THEME, &self.current).await {
            log::error!("[THEME] Failed to save theme: {}", e);
        }
        self.current
    }

    pub fn current(&self) -> Theme {
        self.current
    }
}
