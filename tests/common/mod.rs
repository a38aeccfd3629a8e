//! Scripted fakes for the platform capabilities.

#![allow(dead_code)]

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use locam::capture::{
    AcquireFailure, CaptureDevice, MediaConstraints, MediaStream, MediaTrack, VideoFrame, VideoSink,
};
use locam::host::{
    Clipboard, Dialogs, Downloader, FileSaver, Host, HostError, Navigator, SaveError, SaveOutcome,
};
use locam::scan::{DecodeError, SymbolDecoder};
use locam::storage::{KeyValueStore, MemoryStore, PersistenceError};
use serde_json::Value;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

pub const WAIT: Duration = Duration::from_secs(2);

// ── Camera ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeTrack {
    stopped: AtomicBool,
    pub stop_calls: AtomicUsize,
}

impl MediaTrack for FakeTrack {
    fn stop(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct FakeStream {
    pub track: Arc<FakeTrack>,
}

impl MediaStream for FakeStream {
    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        vec![self.track.clone()]
    }
}

/// Hands out streams; failures can be queued up front.
#[derive(Default)]
pub struct FakeDevice {
    failures: Mutex<VecDeque<AcquireFailure>>,
    pub streams: Mutex<Vec<Arc<FakeStream>>>,
    pub last_constraints: Mutex<Option<MediaConstraints>>,
}

impl FakeDevice {
    pub fn fail_next(&self, failure: AcquireFailure) {
        self.failures.lock().unwrap().push_back(failure);
    }

    pub fn acquisitions(&self) -> usize {
        self.streams.lock().unwrap().len()
    }

    /// Tracks currently live across every stream ever handed out.
    pub fn live_tracks(&self) -> usize {
        self.streams
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.track.is_live())
            .count()
    }
}

#[async_trait]
impl CaptureDevice for FakeDevice {
    async fn acquire(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Arc<dyn MediaStream>, AcquireFailure> {
        *self.last_constraints.lock().unwrap() = Some(constraints.clone());
        if let Some(failure) = self.failures.lock().unwrap().pop_front() {
            return Err(failure);
        }
        let stream = Arc::new(FakeStream::default());
        self.streams.lock().unwrap().push(stream.clone());
        Ok(stream)
    }
}

pub type FrameReady = oneshot::Sender<Result<(), AcquireFailure>>;

/// Video sink that shows a solid frame whenever a stream is attached.
pub struct FakeSink {
    attached: Mutex<Option<Arc<dyn MediaStream>>>,
    frame: VideoFrame,
    first_frame: tokio::sync::Mutex<Option<oneshot::Receiver<Result<(), AcquireFailure>>>>,
    pub attach_calls: AtomicUsize,
}

impl FakeSink {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            attached: Mutex::new(None),
            frame: VideoFrame::new(RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]))),
            first_frame: tokio::sync::Mutex::new(None),
            attach_calls: AtomicUsize::new(0),
        }
    }

    /// A sink whose first frame arrives only when the test says so.
    pub fn gated(width: u32, height: u32) -> (Self, FrameReady) {
        let (tx, rx) = oneshot::channel();
        let sink = Self::new(width, height);
        *sink.first_frame.try_lock().unwrap() = Some(rx);
        (sink, tx)
    }

    pub fn is_attached(&self) -> bool {
        self.attached.lock().unwrap().is_some()
    }
}

#[async_trait]
impl VideoSink for FakeSink {
    fn attach(&self, stream: Option<Arc<dyn MediaStream>>) {
        self.attach_calls.fetch_add(1, Ordering::SeqCst);
        *self.attached.lock().unwrap() = stream;
    }

    async fn wait_frame_ready(&self) -> Result<(), AcquireFailure> {
        let gate = self.first_frame.lock().await.take();
        if let Some(gate) = gate {
            gate.await.unwrap_or_else(|_| {
                Err(AcquireFailure::Other {
                    name: "AbortError".into(),
                    message: "gate dropped".into(),
                })
            })?;
        }
        if self.is_attached() {
            Ok(())
        } else {
            Err(AcquireFailure::Other {
                name: "AbortError".into(),
                message: "no stream".into(),
            })
        }
    }

    async fn next_frame(&self) -> Option<VideoFrame> {
        tokio::task::yield_now().await;
        self.current_frame()
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        self.is_attached().then(|| self.frame.clone())
    }
}

// ── Decoder ─────────────────────────────────────────────────────────

pub type DecodeOutcome = Result<Option<String>, DecodeError>;

/// Each decode waits for the test to push the next outcome.
pub struct ScriptedDecoder {
    outcomes: tokio::sync::Mutex<mpsc::UnboundedReceiver<DecodeOutcome>>,
    entered: mpsc::UnboundedSender<()>,
}

pub struct DecoderScript {
    outcomes: mpsc::UnboundedSender<DecodeOutcome>,
    entered: mpsc::UnboundedReceiver<()>,
}

impl ScriptedDecoder {
    pub fn new() -> (Arc<Self>, DecoderScript) {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let (entered_tx, entered_rx) = mpsc::unbounded_channel();
        let decoder = Arc::new(Self {
            outcomes: tokio::sync::Mutex::new(outcomes_rx),
            entered: entered_tx,
        });
        (
            decoder,
            DecoderScript {
                outcomes: outcomes_tx,
                entered: entered_rx,
            },
        )
    }
}

impl DecoderScript {
    pub fn yields(&self, text: &str) {
        self.outcomes.send(Ok(Some(text.to_string()))).unwrap();
    }

    pub fn nothing(&self) {
        self.outcomes.send(Ok(None)).unwrap();
    }

    pub fn fails(&self, reason: &str) {
        self.outcomes
            .send(Err(DecodeError::Transient(reason.to_string())))
            .unwrap();
    }

    /// Wait until a decode attempt is in flight.
    pub async fn wait_in_flight(&mut self) {
        tokio::time::timeout(WAIT, self.entered.recv())
            .await
            .expect("decoder was never called")
            .expect("decoder dropped");
    }
}

#[async_trait]
impl SymbolDecoder for ScriptedDecoder {
    async fn decode(&self, _frame: &VideoFrame) -> DecodeOutcome {
        let _ = self.entered.send(());
        let mut outcomes = self.outcomes.lock().await;
        match outcomes.recv().await {
            Some(outcome) => outcome,
            None => std::future::pending().await,
        }
    }
}

// ── Host ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeNavigator {
    pub opened_tabs: Mutex<Vec<String>>,
    pub opened_external: Mutex<Vec<String>>,
    pub closed: AtomicBool,
}

#[async_trait]
impl Navigator for FakeNavigator {
    fn extension_url(&self, path: &str) -> String {
        format!("chrome-extension://locam-test/{}", path)
    }

    async fn open_tab(&self, url: &str) -> Result<(), HostError> {
        self.opened_tabs.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn open_external(&self, url: &str) -> Result<(), HostError> {
        self.opened_external.lock().unwrap().push(url.to_string());
        Ok(())
    }

    fn close_window(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeClipboard {
    pub fail: AtomicBool,
    pub written: Mutex<Vec<String>>,
}

#[async_trait]
impl Clipboard for FakeClipboard {
    async fn write_text(&self, text: &str) -> Result<(), HostError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(HostError::Clipboard("denied".into()));
        }
        self.written.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Save dialog that answers with a queued outcome (saves by default).
#[derive(Default)]
pub struct FakeSaver {
    cancel_next: AtomicBool,
    fail_next: AtomicBool,
    pub saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl FakeSaver {
    pub fn cancel_next(&self) {
        self.cancel_next.store(true, Ordering::SeqCst);
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileSaver for FakeSaver {
    async fn save(&self, suggested_name: &str, bytes: &[u8]) -> Result<SaveOutcome, SaveError> {
        if self.cancel_next.swap(false, Ordering::SeqCst) {
            return Ok(SaveOutcome::Cancelled);
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(SaveError::Dialog("disk full".into()));
        }
        self.saved
            .lock()
            .unwrap()
            .push((suggested_name.to_string(), bytes.to_vec()));
        Ok(SaveOutcome::Saved(PathBuf::from("/saved").join(suggested_name)))
    }
}

#[derive(Default)]
pub struct FakeDownloader {
    pub downloads: Mutex<Vec<String>>,
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, file_name: &str, _bytes: &[u8]) -> Result<PathBuf, SaveError> {
        self.downloads.lock().unwrap().push(file_name.to_string());
        Ok(PathBuf::from("/downloads").join(file_name))
    }
}

pub struct FakeDialogs {
    pub answer: AtomicBool,
    pub confirms: Mutex<Vec<String>>,
    pub alerts: Mutex<Vec<String>>,
}

impl Default for FakeDialogs {
    fn default() -> Self {
        Self {
            answer: AtomicBool::new(true),
            confirms: Mutex::default(),
            alerts: Mutex::default(),
        }
    }
}

#[async_trait]
impl Dialogs for FakeDialogs {
    async fn confirm(&self, message: &str) -> bool {
        self.confirms.lock().unwrap().push(message.to_string());
        self.answer.load(Ordering::SeqCst)
    }

    async fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

// ── Storage ─────────────────────────────────────────────────────────

/// In-memory store whose reads or writes can be switched to failing.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl FlakyStore {
    fn check(flag: &AtomicBool, what: &str) -> Result<(), PersistenceError> {
        if flag.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(format!("{} refused", what)));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), PersistenceError> {
        Self::check(&self.fail_writes, "write")?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        Self::check(&self.fail_writes, "write")?;
        self.inner.remove(key).await
    }
}

/// Every fake, kept around so tests can inspect them.
pub struct Fakes {
    pub device: Arc<FakeDevice>,
    pub navigator: Arc<FakeNavigator>,
    pub clipboard: Arc<FakeClipboard>,
    pub saver: Arc<FakeSaver>,
    pub downloader: Arc<FakeDownloader>,
    pub dialogs: Arc<FakeDialogs>,
    pub storage: Arc<FlakyStore>,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            device: Arc::new(FakeDevice::default()),
            navigator: Arc::new(FakeNavigator::default()),
            clipboard: Arc::new(FakeClipboard::default()),
            saver: Arc::new(FakeSaver::default()),
            downloader: Arc::new(FakeDownloader::default()),
            dialogs: Arc::new(FakeDialogs::default()),
            storage: Arc::new(FlakyStore::default()),
        }
    }

    pub fn host(&self) -> Host {
        Host {
            navigator: self.navigator.clone(),
            clipboard: self.clipboard.clone(),
            file_saver: Some(self.saver.clone()),
            downloader: self.downloader.clone(),
            dialogs: self.dialogs.clone(),
            storage: self.storage.clone(),
        }
    }

    /// Host without a save dialog: captures fall back to downloads.
    pub fn host_without_saver(&self) -> Host {
        Host {
            file_saver: None,
            ..self.host()
        }
    }

    pub fn storage(&self) -> Arc<dyn KeyValueStore> {
        self.storage.clone()
    }
}
