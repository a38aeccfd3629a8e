//! Still capture: rasterizes a video frame into an image payload.
//!
//! Pure functions, no infrastructure. Frame in, PNG bytes out.

use super::device::VideoFrame;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encodes a frame as PNG at the frame's native dimensions.
pub fn frame_to_png_bytes(frame: &VideoFrame) -> Result<Vec<u8>, StillError> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(StillError::ZeroDimension);
    }

    let bitmap = DynamicImage::ImageRgba8(frame.image().clone());

    let mut png_bytes: Vec<u8> = Vec::new();
    bitmap
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| StillError::EncodingFailed(e.to_string()))?;

    Ok(png_bytes)
}

/// Wraps PNG bytes into a self-describing `data:` URL.
pub fn png_data_url(png_bytes: &[u8]) -> String {
    format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(png_bytes))
}

/// Inverse of [`png_data_url`], used when re-exporting a gallery image.
pub fn png_bytes_from_data_url(data_url: &str) -> Result<Vec<u8>, StillError> {
    let payload = data_url
        .strip_prefix(PNG_DATA_URL_PREFIX)
        .ok_or(StillError::NotPngDataUrl)?;
    STANDARD
        .decode(payload)
        .map_err(|e| StillError::InvalidPayload(e.to_string()))
}

/// A captured still, ready for saving and for the gallery.
#[derive(Debug, Clone)]
pub struct Still {
    pub width: u32,
    pub height: u32,
    pub png_bytes: Vec<u8>,
}

impl Still {
    pub fn from_frame(frame: &VideoFrame) -> Result<Self, StillError> {
        let start = std::time::Instant::now();
        let png_bytes = frame_to_png_bytes(frame)?;
        log::info!(
            "[CAPTURE] Rasterized {}x{} frame in {}ms ({} bytes)",
            frame.width(),
            frame.height(),
            start.elapsed().as_millis(),
            png_bytes.len()
        );
        Ok(Self {
            width: frame.width(),
            height: frame.height(),
            png_bytes,
        })
    }

    pub fn data_url(&self) -> String {
        png_data_url(&self.png_bytes)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StillError {
    #[error("Frame has zero width or height")]
    ZeroDimension,

    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Not a PNG data URL")]
    NotPngDataUrl,

    #[error("Invalid base64 payload: {0}")]
    InvalidPayload(String),
}
