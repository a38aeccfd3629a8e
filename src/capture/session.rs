//! Capture device session: owns one camera stream bound to one video sink.

use super::device::{AcquireFailure, CaptureDevice, MediaConstraints, MediaStream, VideoFrame, VideoSink};
use std::sync::Arc;

/// Camera acquisition failure, worded for the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    #[error("Camera access denied. Please allow camera permissions in your browser settings.")]
    PermissionDenied,

    #[error("No camera detected. Please connect a camera and try again.")]
    DeviceNotFound,

    #[error("Camera is in use by another application.")]
    DeviceBusy,

    #[error("Camera unavailable. Try restarting your browser.")]
    ConstraintsUnsatisfiable,

    #[error("Camera unavailable. Check browser permissions.")]
    Unknown { detail: String },
}

impl From<AcquireFailure> for CameraError {
    fn from(failure: AcquireFailure) -> Self {
        match failure {
            AcquireFailure::NotAllowed(_) => CameraError::PermissionDenied,
            AcquireFailure::NotFound(_) => CameraError::DeviceNotFound,
            AcquireFailure::NotReadable(_) => CameraError::DeviceBusy,
            AcquireFailure::Overconstrained(_) => CameraError::ConstraintsUnsatisfiable,
            other @ AcquireFailure::Other { .. } => CameraError::Unknown {
                detail: other.to_string(),
            },
        }
    }
}

pub struct CaptureDeviceSession {
    name: &'static str,
    device: Arc<dyn CaptureDevice>,
    sink: Arc<dyn VideoSink>,
    constraints: MediaConstraints,
    stream: Option<Arc<dyn MediaStream>>,
}

impl CaptureDeviceSession {
    pub fn new(
        name: &'static str,
        device: Arc<dyn CaptureDevice>,
        sink: Arc<dyn VideoSink>,
        constraints: MediaConstraints,
    ) -> Self {
        Self {
            name,
            device,
            sink,
            constraints,
            stream: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn sink(&self) -> &Arc<dyn VideoSink> {
        &self.sink
    }

    /// Acquire the camera and wait until the sink shows its first frame.
    ///
    /// A no-op while already active. A stale handle (stream ended on the
    /// platform side) is released before a new one is requested.
    pub async fn start(&mut self) -> Result<(), CameraError> {
        if self.is_active() {
            log::debug!("[CAMERA] {} already active, start ignored", self.name);
            return Ok(());
        }
        self.stop();

        let start = std::time::Instant::now();
        let stream = match self.device.acquire(&self.constraints).await {
            Ok(stream) => stream,
            Err(failure) => {
                log::warn!("[CAMERA] {} acquisition failed: {}", self.name, failure);
                return Err(failure.into());
            }
        };
        let acquire_ms = start.elapsed().as_millis();

        self.sink.attach(Some(stream.clone()));
        self.stream = Some(stream);

        if let Err(failure) = self.sink.wait_frame_ready().await {
            log::warn!("[CAMERA] {} never produced a frame: {}", self.name, failure);
            self.stop();
            return Err(failure.into());
        }

        log::info!(
            "[CAMERA] {} live: stream in {}ms, first frame in {}ms",
            self.name,
            acquire_ms,
            start.elapsed().as_millis()
        );
        Ok(())
    }

    /// Release every track and detach from the sink. Safe when stopped.
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            let tracks = stream.tracks();
            for track in &tracks {
                track.stop();
            }
            self.sink.attach(None);
            log::info!("[CAMERA] {} stopped ({} tracks released)", self.name, tracks.len());
        }
    }

    pub fn is_active(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.is_active())
    }

    pub fn current_frame(&self) -> Option<VideoFrame> {
        if self.stream.is_none() {
            return None;
        }
        self.sink.current_frame()
    }
}

impl Drop for CaptureDeviceSession {
    fn drop(&mut self) {
        self.stop();
    }
}
