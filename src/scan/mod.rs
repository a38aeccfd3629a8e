//! Code recognition loop: continuous decoding against a live video sink.
//!
//! One spawned task per scanning run. Each attempt waits for the sink's next
//! display frame, hands it to the decoder, and delivers the text only if it
//! differs from the previous delivery. Stopping aborts the run's task and
//! clears the callback under the lock every delivery checks first.
//!
//! The callback runs outside that lock, so it may stop (or restart) the loop
//! itself. A stop issued from another thread can race one delivery that had
//! already passed the check; consumers that need strict silence tag results
//! with their run, as the session controller does.

pub mod link;

pub use link::{classify_link, is_valid_url, LinkKind};

use crate::capture::{VideoFrame, VideoSink};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

/// External symbol decoder (QR and barcode).
#[async_trait]
pub trait SymbolDecoder: Send + Sync {
    /// `Ok(None)` when the frame holds no readable symbol.
    async fn decode(&self, frame: &VideoFrame) -> Result<Option<String>, DecodeError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DecodeError {
    #[error("Decode attempt failed: {0}")]
    Transient(String),
}

type ResultCallback = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Default)]
struct LoopState {
    running: bool,
    run_id: u64,
    last_delivered: Option<String>,
    on_result: Option<ResultCallback>,
    task: Option<JoinHandle<()>>,
}

pub struct RecognitionLoop {
    decoder: Arc<dyn SymbolDecoder>,
    state: Arc<Mutex<LoopState>>,
}

impl RecognitionLoop {
    pub fn new(decoder: Arc<dyn SymbolDecoder>) -> Self {
        Self {
            decoder,
            state: Arc::new(Mutex::new(LoopState::default())),
        }
    }

    /// Begin scanning `source`. Replaces any run already in progress.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_scanning<F>(&self, source: Arc<dyn VideoSink>, on_result: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let mut state = lock(&self.state);
        if let Some(previous) = state.task.take() {
            previous.abort();
        }
        state.run_id += 1;
        state.running = true;
        state.last_delivered = None;
        state.on_result = Some(Arc::new(on_result));
        let run_id = state.run_id;
        state.task = Some(tokio::spawn(run(
            self.decoder.clone(),
            source,
            self.state.clone(),
            run_id,
        )));
        drop(state);

        log::info!("[SCAN] Recognition loop started (run {})", run_id);
    }

    /// Stop delivering results and abort the run's task.
    ///
    /// Aborting drops the pending frame wait or decode future; a decoder
    /// backed by a blocking platform call still finishes it, and the result
    /// is discarded. Safe to call from inside the result callback.
    pub fn stop_scanning(&self) {
        let mut state = lock(&self.state);
        if state.running {
            log::info!("[SCAN] Recognition loop stopped (run {})", state.run_id);
        }
        state.running = false;
        state.on_result = None;
        state.last_delivered = None;
        if let Some(task) = state.task.take() {
            task.abort();
        }
    }

    pub fn is_scanning(&self) -> bool {
        lock(&self.state).running
    }
}

impl Drop for RecognitionLoop {
    fn drop(&mut self) {
        self.stop_scanning();
    }
}

fn lock(state: &Mutex<LoopState>) -> MutexGuard<'_, LoopState> {
    // Every writer leaves the fields consistent, so a poisoned lock is still usable.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn is_current(state: &Mutex<LoopState>, run_id: u64) -> bool {
    let state = lock(state);
    state.running && state.run_id == run_id
}

async fn run(
    decoder: Arc<dyn SymbolDecoder>,
    source: Arc<dyn VideoSink>,
    state: Arc<Mutex<LoopState>>,
    run_id: u64,
) {
    let mut attempts: u64 = 0;

    while is_current(&state, run_id) {
        let Some(frame) = source.next_frame().await else {
            continue;
        };
        if !is_current(&state, run_id) {
            break;
        }

        attempts += 1;
        match decoder.decode(&frame).await {
            Ok(Some(text)) => deliver(&state, run_id, text),
            Ok(None) => {}
            Err(e) => log::debug!("[SCAN] Frame {} skipped: {}", attempts, e),
        }
    }

    log::debug!("[SCAN] Run {} exited after {} attempts", run_id, attempts);
}

fn deliver(state: &Mutex<LoopState>, run_id: u64, text: String) {
    let callback = {
        let mut state = lock(state);
        if !state.running || state.run_id != run_id {
            return;
        }
        if state.last_delivered.as_deref() == Some(text.as_str()) {
            return;
        }
        state.last_delivered = Some(text.clone());
        state.on_result.clone()
    };
    if let Some(callback) = callback {
        callback(text);
    }
}
