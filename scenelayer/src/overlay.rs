//! The single overlay slot shown on the map.
//!
//! A new image is attached before the previous one is detached, so the
//! view never shows an empty frame between renders. The decoded image (and
//! therefore its buffer) stays alive exactly as long as its overlay is
//! attached.

use crate::decode::DecodedImage;
use crate::geo::Georeference;
use crate::view::{MapView, OverlayId, ViewError};
use std::sync::Arc;
use tracing::debug;

struct ActiveOverlay {
    id: OverlayId,
    image: DecodedImage,
    georeference: Georeference,
}

/// Owns the overlay currently attached to a [`MapView`].
pub struct OverlayLayerManager<V: MapView> {
    view: Arc<V>,
    active: Option<ActiveOverlay>,
    next_id: u64,
}

impl<V: MapView> OverlayLayerManager<V> {
    pub fn new(view: Arc<V>) -> Self {
        Self {
            view,
            active: None,
            next_id: 1,
        }
    }

    pub fn view(&self) -> &Arc<V> {
        &self.view
    }

    /// Id of the overlay currently on screen.
    pub fn active_id(&self) -> Option<OverlayId> {
        self.active.as_ref().map(|overlay| overlay.id)
    }

    pub fn active_image(&self) -> Option<&DecodedImage> {
        self.active.as_ref().map(|overlay| &overlay.image)
    }

    pub fn active_georeference(&self) -> Option<Georeference> {
        self.active.as_ref().map(|overlay| overlay.georeference)
    }

    /// Replaces the displayed overlay with `image`.
    ///
    /// On error the previous overlay stays attached and `image` is dropped.
    pub fn swap(
        &mut self,
        image: DecodedImage,
        georeference: Georeference,
    ) -> Result<OverlayId, ViewError> {
        let id = OverlayId::new(self.next_id);
        self.next_id += 1;

        self.view.attach_overlay(id, image.pixels(), georeference)?;

        let previous = self.active.replace(ActiveOverlay {
            id,
            image,
            georeference,
        });
        if let Some(previous) = previous {
            self.view.detach_overlay(previous.id);
            debug!(attached = %id, detached = %previous.id, "Overlay swapped");
        } else {
            debug!(attached = %id, "Overlay attached");
        }
        Ok(id)
    }

    /// Removes the overlay from the view and releases its image.
    ///
    /// Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if let Some(active) = self.active.take() {
            self.view.detach_overlay(active.id);
            debug!(overlay = %active.id, "Overlay torn down");
        }
    }
}

impl<V: MapView> Drop for OverlayLayerManager<V> {
    fn drop(&mut self) {
        self.teardown();
    }
}
