//! Session controller: the popup's state machine.
//!
//! Owns the capture sessions, the recognition loop, the gallery and the
//! theme, and maps them onto one `Mode`. Every operation takes `&mut self`,
//! so the host drives it as one logical sequence: a second acquisition can
//! never be issued while one is pending.
//!
//! Recognized codes arrive on a channel tagged with the scanning run that
//! produced them; anything from a run that has since been stopped is dropped.

pub mod mode;
pub mod regions;
pub mod ui;

pub use mode::{Layout, Mode, ScanResult, View};
pub use regions::{GalleryRegion, Regions, ResultRegion, Tab};

use crate::capture::{
    CameraError, CaptureDevice, CaptureDeviceSession, Still, StillError, VideoSink,
};
use crate::config::Config;
use crate::gallery::{GalleryItem, GalleryStore};
use crate::host::{Host, SaveError, SaveOutcome};
use crate::scan::{RecognitionLoop, SymbolDecoder};
use crate::storage::{keys, load_json, save_json};
use crate::theme::{Theme, ThemeManager};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

pub const COPY_FAILED_MESSAGE: &str = "Failed to copy. Please select and copy manually.";
pub const CONFIRM_DELETE_MESSAGE: &str = "Delete this image?";
pub const CONFIRM_CLEAR_MESSAGE: &str = "Delete all captured images?";

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("{layout:?} layout needs {expected} video sinks, got {actual}")]
    SinkCount {
        layout: Layout,
        expected: usize,
        actual: usize,
    },

    #[error("Capture is not offered in the {0:?} view")]
    CaptureUnavailable(View),

    #[error("Camera is not running")]
    CameraNotLive,

    #[error("The camera has not produced a frame yet")]
    NoFrame,

    #[error("No captured image with id {0}")]
    UnknownItem(String),

    #[error(transparent)]
    Still(#[from] StillError),

    #[error(transparent)]
    Save(#[from] SaveError),
}

/// What a manual capture ended in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Saved { id: String, path: PathBuf },
    /// The user dismissed the save dialog; nothing was added.
    Cancelled,
}

type ResultMessage = (u64, String);

pub struct SessionController {
    layout: Layout,
    view: View,
    mode: Mode,
    permission_granted: bool,
    closed: bool,
    recovery_page: String,
    cameras: Vec<CaptureDeviceSession>,
    scanner: RecognitionLoop,
    scan_run: u64,
    results_tx: mpsc::UnboundedSender<ResultMessage>,
    results_rx: mpsc::UnboundedReceiver<ResultMessage>,
    last_result: Option<ScanResult>,
    copied_at: Option<Instant>,
    gallery: GalleryStore,
    theme: ThemeManager,
    host: Host,
}

impl SessionController {
    /// One video sink per camera the layout uses, in slot order.
    pub fn new(
        config: &Config,
        host: Host,
        device: Arc<dyn CaptureDevice>,
        sinks: Vec<Arc<dyn VideoSink>>,
        decoder: Arc<dyn SymbolDecoder>,
    ) -> Result<Self, ControllerError> {
        let layout = config.layout;
        if sinks.len() != layout.camera_count() {
            return Err(ControllerError::SinkCount {
                layout,
                expected: layout.camera_count(),
                actual: sinks.len(),
            });
        }

        let names: &[&'static str] = match layout {
            Layout::Tabbed => &["scanner camera", "capture camera"],
            Layout::Single | Layout::SharedCamera => &["camera"],
        };
        let cameras = sinks
            .into_iter()
            .zip(names)
            .map(|(sink, &name)| {
                CaptureDeviceSession::new(name, device.clone(), sink, config.constraints.clone())
            })
            .collect();

        let (results_tx, results_rx) = mpsc::unbounded_channel();

        Ok(Self {
            layout,
            view: View::Scanner,
            mode: Mode::PermissionPending,
            permission_granted: false,
            closed: false,
            recovery_page: config.recovery_page.clone(),
            cameras,
            scanner: RecognitionLoop::new(decoder),
            scan_run: 0,
            results_tx,
            results_rx,
            last_result: None,
            copied_at: None,
            gallery: GalleryStore::new(host.storage.clone()),
            theme: ThemeManager::new(host.storage.clone()),
            host,
        })
    }

    /// Load persisted preferences and captures. Leaves the popup in
    /// `PermissionPending` on the scanner view.
    pub async fn initialize(&mut self) {
        self.theme.load().await;
        self.permission_granted =
            match load_json::<bool>(self.host.storage.as_ref(), keys::CAMERA_PERMISSION_GRANTED).await {
                Ok(granted) => granted.unwrap_or(false),
                Err(e) => {
                    log::warn!("[SESSION] Could not read permission flag: {}", e);
                    false
                }
            };
        self.gallery.load().await;
        self.view = View::Scanner;
        self.mode = Mode::PermissionPending;
        log::info!(
            "[SESSION] Popup ready: layout {:?}, theme {}, {} captures",
            self.layout,
            self.theme.current().as_str(),
            self.gallery.len()
        );
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn last_result(&self) -> Option<&ScanResult> {
        self.last_result.as_ref()
    }

    pub fn gallery(&self) -> &GalleryStore {
        &self.gallery
    }

    pub fn theme(&self) -> Theme {
        self.theme.current()
    }

    pub fn is_scanning(&self) -> bool {
        self.scanner.is_scanning()
    }

    /// Whether the popup redirected to the recovery page and closed itself.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether the camera session at `slot` holds a live stream.
    pub fn is_camera_active(&self, slot: usize) -> bool {
        self.cameras.get(slot).is_some_and(|c| c.is_active())
    }

    /// The access button of the permission prompt.
    pub async fn request_permission(&mut self) {
        if self.mode != Mode::PermissionPending {
            log::debug!("[SESSION] Permission request ignored in {}", self.mode.name());
            return;
        }
        self.start_camera().await;
    }

    /// Retry after an inline camera error.
    pub async fn retry(&mut self) {
        if !matches!(self.mode, Mode::Error(_)) {
            return;
        }
        self.start_camera().await;
    }

    /// The start/stop button.
    pub async fn toggle_camera(&mut self) {
        if self.mode.is_camera_live() || self.current_camera_active() {
            self.stop_camera();
        } else {
            self.start_camera().await;
        }
    }

    /// Switch tabs. Leaving a camera view always releases the camera; the
    /// gallery never holds one. Returns false for a view the layout lacks.
    pub async fn switch_view(&mut self, view: View) -> bool {
        if !self.layout.views().contains(&view) {
            log::warn!("[SESSION] {:?} layout has no {:?} view", self.layout, view);
            return false;
        }
        if view == self.view {
            return true;
        }

        self.release_cameras();
        self.view = view;

        if view == View::Gallery {
            self.gallery.reload().await;
            self.mode = Mode::Gallery;
        } else if self.permission_granted {
            self.mode = Mode::Idle;
        } else {
            self.mode = Mode::PermissionPending;
        }
        log::info!("[SESSION] Switched to {:?} ({})", view, self.mode.name());
        true
    }

    /// Wait for the next recognized code and apply it.
    pub async fn next_result(&mut self) -> Option<ScanResult> {
        loop {
            let (run, text) = self.results_rx.recv().await?;
            if self.accept_result(run, text) {
                return self.last_result.clone();
            }
        }
    }

    /// Apply every recognized code already queued. Returns how many applied.
    pub fn process_pending_results(&mut self) -> usize {
        let mut applied = 0;
        while let Ok((run, text)) = self.results_rx.try_recv() {
            if self.accept_result(run, text) {
                applied += 1;
            }
        }
        applied
    }

    /// Copy the shown result. Failure is reported with a blocking alert.
    pub async fn copy_result(&mut self) -> bool {
        let Some(text) = self.last_result.as_ref().map(|r| r.text.clone()) else {
            return false;
        };
        match self.host.clipboard.write_text(&text).await {
            Ok(()) => {
                self.copied_at = Some(Instant::now());
                true
            }
            Err(e) => {
                log::error!("[SESSION] Failed to copy: {}", e);
                self.host.dialogs.alert(COPY_FAILED_MESSAGE).await;
                false
            }
        }
    }

    /// Open the shown result if it is a link.
    pub async fn open_result(&self) -> bool {
        let Some(result) = self.last_result.as_ref().filter(|r| r.is_link()) else {
            return false;
        };
        match self.host.navigator.open_external(&result.text).await {
            Ok(()) => true,
            Err(e) => {
                log::error!("[SESSION] Failed to open result: {}", e);
                false
            }
        }
    }

    /// Rasterize the current frame, save it, and add it to the gallery.
    pub async fn capture_still(&mut self) -> Result<CaptureOutcome, ControllerError> {
        if !self.layout.captures_in(self.view) {
            return Err(ControllerError::CaptureUnavailable(self.view));
        }
        let camera = self
            .layout
            .camera_slot(self.view)
            .and_then(|slot| self.cameras.get(slot))
            .filter(|c| c.is_active())
            .ok_or(ControllerError::CameraNotLive)?;
        let frame = camera.current_frame().ok_or(ControllerError::NoFrame)?;

        let still = Still::from_frame(&frame)?;
        let taken_at = Utc::now();

        let path = match self.save_bytes(&capture_file_name(taken_at), &still.png_bytes).await? {
            SaveOutcome::Saved(path) => path,
            SaveOutcome::Cancelled => return Ok(CaptureOutcome::Cancelled),
        };

        let id = self
            .gallery
            .add(GalleryItem::captured_at(still.data_url(), taken_at))
            .await;
        Ok(CaptureOutcome::Saved { id, path })
    }

    /// Save a gallery image to disk again.
    pub async fn export_item(&self, id: &str) -> Result<SaveOutcome, ControllerError> {
        let item = self
            .gallery
            .get(id)
            .ok_or_else(|| ControllerError::UnknownItem(id.to_string()))?;
        let bytes = crate::capture::still::png_bytes_from_data_url(&item.image)?;
        self.save_bytes(&capture_file_name(item.timestamp), &bytes).await
    }

    /// Delete one capture after confirmation.
    pub async fn delete_item(&mut self, id: &str) -> bool {
        if self.gallery.get(id).is_none() {
            return false;
        }
        if !self.host.dialogs.confirm(CONFIRM_DELETE_MESSAGE).await {
            return false;
        }
        self.gallery.remove(id).await
    }

    /// Delete every capture after confirmation.
    pub async fn clear_gallery(&mut self) -> bool {
        if self.gallery.is_empty() {
            return false;
        }
        if !self.host.dialogs.confirm(CONFIRM_CLEAR_MESSAGE).await {
            return false;
        }
        self.gallery.clear().await;
        true
    }

    pub async fn toggle_theme(&mut self) -> Theme {
        self.theme.toggle().await
    }

    /// Popup unload: stop scanning and release every camera.
    pub fn shutdown(&mut self) {
        self.release_cameras();
        log::info!("[SESSION] Shut down");
    }

    fn current_camera_active(&self) -> bool {
        self.layout
            .camera_slot(self.view)
            .is_some_and(|slot| self.is_camera_active(slot))
    }

    async fn start_camera(&mut self) {
        if self.closed {
            return;
        }
        let Some(slot) = self.layout.camera_slot(self.view) else {
            log::warn!("[SESSION] {:?} view has no camera", self.view);
            return;
        };

        // The platform may allow a single open camera: release the others first.
        self.stop_scanning();
        for (i, camera) in self.cameras.iter_mut().enumerate() {
            if i != slot {
                camera.stop();
            }
        }

        match self.cameras[slot].start().await {
            Ok(()) => {
                self.remember_permission().await;
                if self.layout.scans_in(self.view) {
                    self.start_scanning(slot);
                    self.mode = Mode::Scanning;
                } else {
                    self.mode = Mode::PreviewActive;
                }
                log::info!("[SESSION] Camera live ({})", self.mode.name());
            }
            Err(CameraError::PermissionDenied) => self.redirect_to_recovery().await,
            Err(e) => {
                log::warn!("[SESSION] Camera unavailable: {:?}", e);
                self.mode = Mode::Error(e.to_string());
            }
        }
    }

    fn stop_camera(&mut self) {
        self.stop_scanning();
        if let Some(slot) = self.layout.camera_slot(self.view) {
            self.cameras[slot].stop();
        }
        self.mode = Mode::Idle;
    }

    fn release_cameras(&mut self) {
        self.stop_scanning();
        for camera in &mut self.cameras {
            camera.stop();
        }
    }

    fn start_scanning(&mut self, slot: usize) {
        self.scan_run += 1;
        let run = self.scan_run;
        let tx = self.results_tx.clone();
        let sink = self.cameras[slot].sink().clone();
        self.scanner.start_scanning(sink, move |text| {
            // The receiver lives as long as the controller.
            let _ = tx.send((run, text));
        });
    }

    fn stop_scanning(&mut self) {
        self.scanner.stop_scanning();
        self.scan_run += 1;
    }

    fn accept_result(&mut self, run: u64, text: String) -> bool {
        if run != self.scan_run || !self.scanner.is_scanning() {
            log::debug!("[SESSION] Dropped result from stopped run {}", run);
            return false;
        }
        let result = ScanResult::new(text);
        log::info!(
            "[SESSION] Recognized {} chars (link: {})",
            result.text.len(),
            result.is_link()
        );
        self.last_result = Some(result);
        self.copied_at = None;
        self.mode = Mode::ResultShown;
        true
    }

    async fn remember_permission(&mut self) {
        if self.permission_granted {
            return;
        }
        self.permission_granted = true;
        if let Err(e) = save_json(self.host.storage.as_ref(), keys::CAMERA_PERMISSION_GRANTED, &true).await {
            log::error!("[SESSION] Failed to record granted permission: {}", e);
        }
    }

    async fn redirect_to_recovery(&mut self) {
        self.release_cameras();
        let url = self.host.navigator.extension_url(&self.recovery_page);
        log::info!("[SESSION] Camera access denied, opening {}", url);
        if let Err(e) = self.host.navigator.open_tab(&url).await {
            log::error!("[SESSION] Failed to open recovery page: {}", e);
        }
        self.host.navigator.close_window();
        self.closed = true;
    }

    async fn save_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<SaveOutcome, ControllerError> {
        let saved = match &self.host.file_saver {
            Some(saver) => saver.save(file_name, bytes).await,
            None => self
                .host
                .downloader
                .download(file_name, bytes)
                .await
                .map(SaveOutcome::Saved),
        };
        match saved {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                log::error!("[CAPTURE] Save failed: {}", e);
                self.host
                    .dialogs
                    .alert(&format!("Failed to save image: {}", e))
                    .await;
                Err(e.into())
            }
        }
    }
}

fn capture_file_name(taken_at: DateTime<Utc>) -> String {
    format!("locam-capture-{}.png", taken_at.format("%Y%m%d-%H%M%S-%3f"))
}
