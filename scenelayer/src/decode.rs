//! Decoding of service payloads into displayable images.
//!
//! Decoding is CPU-bound and runs on Tokio's blocking pool. The payload is
//! tracked by a [`BlobHandle`] for as long as the decoded image lives; a
//! payload that fails to decode releases its handle immediately.

use crate::blob::{BlobHandle, BlobRegistry};
use image::RgbaImage;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// Payload is empty
    #[error("empty image payload")]
    Empty,

    /// Payload is not a supported image
    #[error("invalid image data: {0}")]
    InvalidImage(String),

    /// Decode task panicked or was aborted
    #[error("decode task failed: {0}")]
    TaskFailed(String),
}

/// A decoded RGBA image together with the buffer that backs it.
#[derive(Debug)]
pub struct DecodedImage {
    pixels: Arc<RgbaImage>,
    blob: BlobHandle,
}

impl DecodedImage {
    /// Shared pixel data, handed to the view when the image is displayed.
    pub fn pixels(&self) -> Arc<RgbaImage> {
        Arc::clone(&self.pixels)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn blob(&self) -> &BlobHandle {
        &self.blob
    }
}

/// Decodes `payload`, tracking it in `blobs` until the result is dropped.
pub async fn decode_image(
    payload: Vec<u8>,
    blobs: &Arc<BlobRegistry>,
) -> Result<DecodedImage, DecodeError> {
    if payload.is_empty() {
        return Err(DecodeError::Empty);
    }

    let blob = blobs.allocate(payload.len());

    let pixels = tokio::task::spawn_blocking(move || {
        image::load_from_memory(&payload)
            .map(|img| img.to_rgba8())
            .map_err(|e| DecodeError::InvalidImage(e.to_string()))
    })
    .await
    .map_err(|e| DecodeError::TaskFailed(e.to_string()))??;

    debug!(
        blob = %blob.id(),
        width = pixels.width(),
        height = pixels.height(),
        "Image decoded"
    );

    Ok(DecodedImage {
        pixels: Arc::new(pixels),
        blob,
    })
}
