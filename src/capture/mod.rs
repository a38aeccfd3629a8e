//! Camera capture domain: public API.
//!
//! `device` is the platform seam, `session` owns a live stream,
//! `still` turns a frame into an image payload.

pub mod device;
pub mod session;
pub mod still;

pub use device::{
    AcquireFailure, CaptureDevice, FacingMode, MediaConstraints, MediaStream, MediaTrack,
    VideoFrame, VideoSink,
};
pub use session::{CameraError, CaptureDeviceSession};
pub use still::{Still, StillError};
