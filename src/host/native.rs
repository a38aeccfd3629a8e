//! Native implementations of the host capabilities.
//!
//! The clipboard and dialogs are blocking APIs, so each call runs on
//! tokio's blocking pool.

use super::{Clipboard, Dialogs, Downloader, FileSaver, HostError, SaveError, SaveOutcome};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

const DIALOG_TITLE: &str = "Locam";

/// System clipboard via `arboard`.
pub struct SystemClipboard;

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<(), HostError> {
        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            let mut clipboard =
                arboard::Clipboard::new().map_err(|e| HostError::Clipboard(e.to_string()))?;
            clipboard
                .set_text(text)
                .map_err(|e| HostError::Clipboard(e.to_string()))
        })
        .await
        .map_err(|e| HostError::Clipboard(format!("Clipboard task failed: {}", e)))?
    }
}

/// Native "Save as" dialog via `rfd`.
pub struct DialogFileSaver;

impl DialogFileSaver {
    /// `Some` when a native dialog can be shown on this host.
    pub fn probe() -> Option<Self> {
        if cfg!(any(target_os = "macos", target_os = "windows")) {
            return Some(Self);
        }
        let has_display = ["DISPLAY", "WAYLAND_DISPLAY"]
            .iter()
            .any(|var| std::env::var_os(var).is_some_and(|v| !v.is_empty()));
        has_display.then_some(Self)
    }
}

#[async_trait]
impl FileSaver for DialogFileSaver {
    async fn save(&self, suggested_name: &str, bytes: &[u8]) -> Result<SaveOutcome, SaveError> {
        let name = suggested_name.to_string();
        let picked = tokio::task::spawn_blocking(move || {
            rfd::FileDialog::new()
                .set_title(DIALOG_TITLE)
                .set_file_name(&name)
                .add_filter("PNG image", &["png"])
                .save_file()
        })
        .await
        .map_err(|e| SaveError::Dialog(e.to_string()))?;

        let Some(path) = picked else {
            log::info!("[HOST] Save dialog cancelled");
            return Ok(SaveOutcome::Cancelled);
        };

        write_file(&path, bytes).await?;
        log::info!("[HOST] Saved {} bytes to {}", bytes.len(), path.display());
        Ok(SaveOutcome::Saved(path))
    }
}

/// Direct download into a folder (the user's Downloads by default).
#[derive(Debug, Clone, Default)]
pub struct DownloadFolder {
    dir: Option<PathBuf>,
}

impl DownloadFolder {
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    fn dir(&self) -> Option<PathBuf> {
        self.dir.clone().or_else(dirs::download_dir)
    }
}

#[async_trait]
impl Downloader for DownloadFolder {
    async fn download(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, SaveError> {
        let dir = self.dir().ok_or(SaveError::NoDownloadFolder)?;
        let path = unique_path(&dir, file_name).await;
        write_file(&path, bytes).await?;
        log::info!("[HOST] Downloaded {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

/// `name.png`, then `name (1).png`, `name (2).png`, ... like a browser.
async fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
        return candidate;
    }
    let path = Path::new(file_name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(file_name);
    let ext = path.extension().and_then(|s| s.to_str());
    let mut n = 1;
    loop {
        let name = match ext {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        let candidate = dir.join(name);
        if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return candidate;
        }
        n += 1;
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), SaveError> {
    let write_err = |source| SaveError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    tokio::fs::write(path, bytes).await.map_err(write_err)
}

/// Native confirm/alert boxes via `rfd`.
pub struct NativeDialogs;

#[async_trait]
impl Dialogs for NativeDialogs {
    async fn confirm(&self, message: &str) -> bool {
        let message = message.to_string();
        tokio::task::spawn_blocking(move || {
            rfd::MessageDialog::new()
                .set_title(DIALOG_TITLE)
                .set_description(message)
                .set_buttons(rfd::MessageButtons::OkCancel)
                .show()
        })
        .await
        .map(|answer| matches!(answer, rfd::MessageDialogResult::Ok | rfd::MessageDialogResult::Yes))
        .unwrap_or(false)
    }

    async fn alert(&self, message: &str) {
        let message = message.to_string();
        let shown = tokio::task::spawn_blocking(move || {
            rfd::MessageDialog::new()
                .set_title(DIALOG_TITLE)
                .set_description(message)
                .set_level(rfd::MessageLevel::Warning)
                .set_buttons(rfd::MessageButtons::Ok)
                .show()
        })
        .await;
        if let Err(e) = shown {
            log::error!("[HOST] Alert dialog failed: {}", e);
        }
    }
}
