//! Camera platform capability: the seam between the session and the host.
//!
//! The host (webview, native shell, test harness) implements these traits.
//! Nothing in here owns hardware; `CaptureDeviceSession` does that.

use async_trait::async_trait;
use image::RgbaImage;
use serde::Serialize;
use std::sync::Arc;

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    User,
    Environment,
}

/// Constraints passed to the platform when acquiring a stream.
///
/// Width and height are ideals, not requirements: the platform may hand back
/// any resolution it can produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaConstraints {
    pub facing_mode: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub audio: bool,
}

impl MediaConstraints {
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.ideal_width = width;
        self.ideal_height = height;
        self
    }
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            ideal_width: 1280,
            ideal_height: 720,
            audio: false,
        }
    }
}

/// Raw acquisition failure as the platform reports it.
///
/// Variants follow the platform's exception names; `CameraError` maps them
/// onto the user-facing taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcquireFailure {
    #[error("NotAllowedError: {0}")]
    NotAllowed(String),

    #[error("NotFoundError: {0}")]
    NotFound(String),

    #[error("NotReadableError: {0}")]
    NotReadable(String),

    #[error("OverconstrainedError: {0}")]
    Overconstrained(String),

    #[error("{name}: {message}")]
    Other { name: String, message: String },
}

/// One hardware track of a stream (video only for this crate).
pub trait MediaTrack: Send + Sync {
    /// Release the underlying hardware. Must be safe to call repeatedly.
    fn stop(&self);

    fn is_live(&self) -> bool;
}

/// A live stream handle returned by `CaptureDevice::acquire`.
pub trait MediaStream: Send + Sync {
    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>>;

    /// Whether the platform still considers the stream active.
    fn is_active(&self) -> bool {
        self.tracks().iter().any(|t| t.is_live())
    }
}

#[async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn acquire(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Arc<dyn MediaStream>, AcquireFailure>;
}

/// A decoded video frame in RGBA8, at the stream's native size.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    image: Arc<RgbaImage>,
}

impl VideoFrame {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// The rendering target a stream is bound to (a `<video>` element on the web).
#[async_trait]
pub trait VideoSink: Send + Sync {
    /// Bind a stream to the sink, or detach with `None`.
    fn attach(&self, stream: Option<Arc<dyn MediaStream>>);

    /// Resolves once the first frame of the attached stream has loaded and
    /// playback started. Distinct from the stream having been obtained.
    async fn wait_frame_ready(&self) -> Result<(), AcquireFailure>;

    /// Resolves on the host's next display frame.
    ///
    /// This is the pacing primitive for the recognition loop: implementations
    /// must not resolve faster than the host renders. `None` means no picture
    /// is available on this tick.
    async fn next_frame(&self) -> Option<VideoFrame>;

    /// The frame currently shown, if any.
    fn current_frame(&self) -> Option<VideoFrame>;
}
