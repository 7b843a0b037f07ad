//! Render errors.

use crate::decode::DecodeError;
use crate::service::ServiceError;
use crate::view::ViewError;
use thiserror::Error;

/// Errors that end a render without changing the displayed overlay.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// Superseded by a newer render; expected, not a fault
    #[error("render request canceled")]
    Canceled,

    /// Transport error or non-success status from the image service
    #[error("network failure: {0}")]
    NetworkFailure(#[from] ServiceError),

    /// Payload received but not a valid image
    #[error("decode failure: {0}")]
    DecodeFailure(#[from] DecodeError),

    /// The view refused the new overlay
    #[error("overlay update failed: {0}")]
    Overlay(#[from] ViewError),
}

impl RenderError {
    #[inline]
    pub fn is_canceled(&self) -> bool {
        matches!(self, RenderError::Canceled)
    }
}
