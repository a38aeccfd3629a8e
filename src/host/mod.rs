//! Host capabilities: everything the popup asks of the platform besides
//! the camera and the decoder.
//!
//! Resolved once at startup into a single `Host` value. The optional
//! file-save capability is probed here; the controller only ever sees
//! `Option<Arc<dyn FileSaver>>`.

mod native;

pub use native::{DialogFileSaver, DownloadFolder, NativeDialogs, SystemClipboard};

use crate::storage::KeyValueStore;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No download folder available")]
    NoDownloadFolder,

    #[error("Save dialog failed: {0}")]
    Dialog(String),
}

/// Result of a save attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    /// The user dismissed the save dialog. Not an error.
    Cancelled,
}

#[async_trait]
pub trait Navigator: Send + Sync {
    /// Absolute URL of a page bundled with the extension.
    fn extension_url(&self, path: &str) -> String;

    async fn open_tab(&self, url: &str) -> Result<(), HostError>;

    /// Open a decoded link outside the extension, without an opener.
    async fn open_external(&self, url: &str) -> Result<(), HostError>;

    /// Close the popup (or the page hosting the controller).
    fn close_window(&self);
}

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), HostError>;
}

/// Prompts for a location and writes the file there.
#[async_trait]
pub trait FileSaver: Send + Sync {
    async fn save(&self, suggested_name: &str, bytes: &[u8]) -> Result<SaveOutcome, SaveError>;
}

/// Writes a file without prompting (the browser's direct download).
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, SaveError>;
}

/// Blocking confirmation and notification dialogs.
#[async_trait]
pub trait Dialogs: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
    async fn alert(&self, message: &str);
}

/// All platform capabilities of one popup session.
#[derive(Clone)]
pub struct Host {
    pub navigator: Arc<dyn Navigator>,
    pub clipboard: Arc<dyn Clipboard>,
    pub file_saver: Option<Arc<dyn FileSaver>>,
    pub downloader: Arc<dyn Downloader>,
    pub dialogs: Arc<dyn Dialogs>,
    pub storage: Arc<dyn KeyValueStore>,
}

impl Host {
    /// Desktop host: native clipboard, dialogs and download folder, with the
    /// save dialog only when a display is available.
    pub fn native(navigator: Arc<dyn Navigator>, storage: Arc<dyn KeyValueStore>) -> Self {
        let file_saver = DialogFileSaver::probe().map(|s| Arc::new(s) as Arc<dyn FileSaver>);
        log::info!(
            "[HOST] Save dialog {}",
            if file_saver.is_some() { "available" } else { "unavailable, using download folder" }
        );
        Self {
            navigator,
            clipboard: Arc::new(SystemClipboard),
            file_saver,
            downloader: Arc::new(DownloadFolder::default()),
            dialogs: Arc::new(NativeDialogs),
            storage,
        }
    }
}
