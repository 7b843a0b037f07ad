//! Map view collaborator.
//!
//! The render pipeline never draws by itself. It hands decoded imagery to a
//! [`MapView`], which positions it on the map, reports when it has finished
//! redrawing, and can take a pixel snapshot of what is on screen.
//! [`OffscreenView`] is a headless implementation used by the CLI and tests.

mod offscreen;

pub use offscreen::OffscreenView;

use crate::geo::{Georeference, ViewState};
use image::RgbaImage;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

/// Handle of an overlay attached to a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(u64);

impl OverlayId {
    pub fn new(raw: u64) -> Self {
        OverlayId(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay-{}", self.0)
    }
}

/// Errors reported by the view.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewError {
    #[error("{0} is not attached to the view")]
    NotAttached(OverlayId),

    #[error("failed to attach overlay: {0}")]
    Attach(String),

    #[error("screenshot failed: {0}")]
    Screenshot(String),

    /// The view was destroyed while a caller was waiting on it
    #[error("view is no longer available")]
    Unavailable,
}

/// The map view that displays rendered overlays.
pub trait MapView: Send + Sync {
    /// Current extent and pixel size.
    fn view_state(&self) -> ViewState;

    /// Notifies on every extent or size change.
    fn watch_view_state(&self) -> watch::Receiver<ViewState>;

    /// Displays `pixels` positioned by `georeference`, above existing overlays.
    fn attach_overlay(
        &self,
        id: OverlayId,
        pixels: Arc<RgbaImage>,
        georeference: Georeference,
    ) -> Result<(), ViewError>;

    /// Removes an overlay. Unknown ids are ignored.
    fn detach_overlay(&self, id: OverlayId);

    /// Resolves once the view has a renderable presence for the overlay.
    fn when_layer_view(&self, id: OverlayId)
        -> impl Future<Output = Result<(), ViewError>> + Send;

    /// `true` while the view is still redrawing.
    fn watch_updating(&self) -> watch::Receiver<bool>;

    /// Captures the visible pixels as an encoded PNG.
    fn take_screenshot(&self) -> impl Future<Output = Result<Vec<u8>, ViewError>> + Send;
}
