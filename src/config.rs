//! Runtime configuration from the environment (and `.env`, if present).

use crate::capture::MediaConstraints;
use crate::session::Layout;
use crate::storage::JsonFileStore;
use std::path::PathBuf;

pub const DEFAULT_RECOVERY_PAGE: &str = "camera-access.html";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub layout: Layout,
    pub store_path: PathBuf,
    pub constraints: MediaConstraints,
    pub recovery_page: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: unknown layout '{value}' (expected single, tabbed or shared)")]
    InvalidLayout { var: &'static str, value: String },

    #[error("{var}: expected a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: Layout::SharedCamera,
            store_path: JsonFileStore::default_path(),
            constraints: MediaConstraints::default(),
            recovery_page: DEFAULT_RECOVERY_PAGE.to_string(),
        }
    }
}

impl Config {
    /// Load `.env` (a missing file is fine) and read `LOCAM_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable lookup; unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("LOCAM_LAYOUT") {
            config.layout = Layout::parse(&value).ok_or(ConfigError::InvalidLayout {
                var: "LOCAM_LAYOUT",
                value,
            })?;
        }
        if let Some(value) = lookup("LOCAM_STORE_PATH").filter(|v| !v.is_empty()) {
            config.store_path = PathBuf::from(value);
        }

        let width = dimension(&lookup, "LOCAM_CAMERA_WIDTH")?.unwrap_or(config.constraints.ideal_width);
        let height = dimension(&lookup, "LOCAM_CAMERA_HEIGHT")?.unwrap_or(config.constraints.ideal_height);
        config.constraints = config.constraints.with_resolution(width, height);

        if let Some(value) = lookup("LOCAM_RECOVERY_PAGE").filter(|v| !v.is_empty()) {
            config.recovery_page = value;
        }

        Ok(config)
    }

    /// The persistent store at `store_path`.
    pub fn open_store(&self) -> JsonFileStore {
        JsonFileStore::new(self.store_path.clone())
    }
}

fn dimension(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u32>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => match value.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _ => Err(ConfigError::InvalidNumber { var, value }),
        },
    }
}
