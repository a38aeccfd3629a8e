//! Locam: camera QR/barcode scanner and capture session core.
//!
//! This crate is the popup's logic. The host shell wires in:
//! - the camera and its video sinks (capture::device)
//! - a symbol decoder (scan::SymbolDecoder)
//! - platform capabilities: storage, navigation, clipboard, dialogs (host/)
//!
//! and then drives a `SessionController` from its event loop.

pub mod capture;
pub mod config;
pub mod gallery;
pub mod host;
pub mod recovery;
pub mod scan;
pub mod session;
pub mod storage;
pub mod theme;

pub use config::{Config, ConfigError};
pub use session::{ControllerError, SessionController};

use capture::{CaptureDevice, VideoSink};
use host::Host;
use scan::SymbolDecoder;
use std::sync::Arc;

/// Install the `env_logger` backend. `RUST_LOG` overrides the `info` default.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Build a controller and load its persisted state.
pub async fn launch(
    config: &Config,
    host: Host,
    device: Arc<dyn CaptureDevice>,
    sinks: Vec<Arc<dyn VideoSink>>,
    decoder: Arc<dyn SymbolDecoder>,
) -> Result<SessionController, ControllerError> {
    let start = std::time::Instant::now();
    let mut controller = SessionController::new(config, host, device, sinks, decoder)?;
    controller.initialize().await;
    log::info!("Locam popup launched in {}ms", start.elapsed().as_millis());
    Ok(controller)
}
