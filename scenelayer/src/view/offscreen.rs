//! Headless map view that composites overlays into an in-memory canvas.

use super::{MapView, OverlayId, ViewError};
use crate::geo::{Extent, Georeference, ViewSize, ViewState};
use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use parking_lot::Mutex;
use std::io::Cursor;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::trace;

struct Layer {
    id: OverlayId,
    pixels: Arc<RgbaImage>,
    georeference: Georeference,
}

/// A [`MapView`] without a window.
///
/// Overlays are drawn synchronously when attached, so the view reports
/// itself as converged as soon as `attach_overlay` returns.
pub struct OffscreenView {
    layers: Mutex<Vec<Layer>>,
    state: watch::Sender<ViewState>,
    updating: watch::Sender<bool>,
}

impl OffscreenView {
    pub fn new(state: ViewState) -> Self {
        Self {
            layers: Mutex::new(Vec::new()),
            state: watch::Sender::new(state),
            updating: watch::Sender::new(false),
        }
    }

    /// Pans or zooms the view.
    pub fn set_extent(&self, extent: Extent) {
        self.state.send_modify(|state| state.extent = Some(extent));
    }

    pub fn resize(&self, size: ViewSize) {
        self.state.send_modify(|state| state.size = size);
    }

    /// Overlays currently attached, bottom to top.
    pub fn overlay_ids(&self) -> Vec<OverlayId> {
        self.layers.lock().iter().map(|layer| layer.id).collect()
    }

    /// Composites all overlays into a canvas the size of the viewport.
    ///
    /// Returns `None` if the view has not been laid out.
    pub fn render(&self) -> Option<RgbaImage> {
        let (extent, size) = self.state.borrow().renderable()?;
        let mut canvas = RgbaImage::new(size.width, size.height);

        for layer in self.layers.lock().iter() {
            draw_layer(&mut canvas, extent, size, layer);
        }
        Some(canvas)
    }
}

/// Draws one overlay at the pixel rectangle its extent covers in the view.
///
/// The rectangle is clipped to the canvas first, and only the matching part
/// of the overlay is scaled.
fn draw_layer(canvas: &mut RgbaImage, view: Extent, size: ViewSize, layer: &Layer) {
    let target = layer.georeference.extent;
    let sx = size.width as f64 / view.width();
    let sy = size.height as f64 / view.height();

    let left = (target.xmin - view.xmin) * sx;
    let top = (view.ymax - target.ymax) * sy;
    let width = target.width() * sx;
    let height = target.height() * sy;
    let (src_width, src_height) = layer.pixels.dimensions();
    if width < 1.0 || height < 1.0 || src_width == 0 || src_height == 0 {
        return;
    }

    let x0 = left.max(0.0).round();
    let y0 = top.max(0.0).round();
    let x1 = (left + width).min(size.width as f64).round();
    let y1 = (top + height).min(size.height as f64).round();
    if x1 <= x0 || y1 <= y0 {
        return;
    }
    let (out_width, out_height) = ((x1 - x0) as u32, (y1 - y0) as u32);

    // Source pixels under the clipped rectangle
    let px = src_width as f64 / width;
    let py = src_height as f64 / height;
    let crop_x = (((x0 - left) * px).floor() as u32).min(src_width - 1);
    let crop_y = (((y0 - top) * py).floor() as u32).min(src_height - 1);
    let crop_width = (((x1 - left) * px).ceil() as u32).clamp(crop_x + 1, src_width) - crop_x;
    let crop_height = (((y1 - top) * py).ceil() as u32).clamp(crop_y + 1, src_height) - crop_y;

    let (x, y) = (x0 as i64, y0 as i64);
    if (crop_x, crop_y, crop_width, crop_height) == (0, 0, src_width, src_height)
        && (out_width, out_height) == (src_width, src_height)
    {
        imageops::overlay(canvas, layer.pixels.as_ref(), x, y);
        return;
    }

    let source =
        imageops::crop_imm(layer.pixels.as_ref(), crop_x, crop_y, crop_width, crop_height)
            .to_image();
    if source.dimensions() == (out_width, out_height) {
        imageops::overlay(canvas, &source, x, y);
    } else {
        let scaled = imageops::resize(&source, out_width, out_height, FilterType::Triangle);
        imageops::overlay(canvas, &scaled, x, y);
    }
}

impl MapView for OffscreenView {
    fn view_state(&self) -> ViewState {
        *self.state.borrow()
    }

    fn watch_view_state(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    fn attach_overlay(
        &self,
        id: OverlayId,
        pixels: Arc<RgbaImage>,
        georeference: Georeference,
    ) -> Result<(), ViewError> {
        self.updating.send_replace(true);
        {
            let mut layers = self.layers.lock();
            if layers.iter().any(|layer| layer.id == id) {
                self.updating.send_replace(false);
                return Err(ViewError::Attach(format!("{} is already attached", id)));
            }
            layers.push(Layer {
                id,
                pixels,
                georeference,
            });
        }
        trace!(overlay = %id, "Overlay attached");
        self.updating.send_replace(false);
        Ok(())
    }

    fn detach_overlay(&self, id: OverlayId) {
        self.layers.lock().retain(|layer| layer.id != id);
        trace!(overlay = %id, "Overlay detached");
    }

    async fn when_layer_view(&self, id: OverlayId) -> Result<(), ViewError> {
        if self.layers.lock().iter().any(|layer| layer.id == id) {
            Ok(())
        } else {
            Err(ViewError::NotAttached(id))
        }
    }

    fn watch_updating(&self) -> watch::Receiver<bool> {
        self.updating.subscribe()
    }

    async fn take_screenshot(&self) -> Result<Vec<u8>, ViewError> {
        let canvas = self
            .render()
            .ok_or_else(|| ViewError::Screenshot("view has no extent".to_string()))?;

        tokio::task::spawn_blocking(move || {
            let mut out = Cursor::new(Vec::new());
            canvas
                .write_to(&mut out, ImageFormat::Png)
                .map_err(|e| ViewError::Screenshot(e.to_string()))?;
            Ok(out.into_inner())
        })
        .await
        .map_err(|e| ViewError::Screenshot(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn view() -> OffscreenView {
        OffscreenView::new(ViewState::new(
            Extent::new(0.0, 0.0, 100.0, 100.0, 3857),
            ViewSize::new(10, 10),
        ))
    }

    fn solid(width: u32, height: u32, color: [u8; 4]) -> Arc<RgbaImage> {
        Arc::new(RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    #[test]
    fn test_attach_and_detach() {
        let view = view();
        let georef = Georeference::new(view.view_state().extent.unwrap(), ViewSize::new(10, 10));

        view.attach_overlay(OverlayId::new(1), solid(10, 10, [255, 0, 0, 255]), georef)
            .unwrap();
        view.attach_overlay(OverlayId::new(2), solid(10, 10, [0, 255, 0, 255]), georef)
            .unwrap();
        assert_eq!(view.overlay_ids(), vec![OverlayId::new(1), OverlayId::new(2)]);

        let canvas = view.render().unwrap();
        assert_eq!(canvas.get_pixel(5, 5), &Rgba([0, 255, 0, 255]));

        view.detach_overlay(OverlayId::new(2));
        let canvas = view.render().unwrap();
        assert_eq!(canvas.get_pixel(5, 5), &Rgba([255, 0, 0, 255]));
        assert!(!*view.watch_updating().borrow());
    }

    #[test]
    fn test_duplicate_attach_rejected() {
        let view = view();
        let georef = Georeference::new(view.view_state().extent.unwrap(), ViewSize::new(10, 10));
        let id = OverlayId::new(1);

        view.attach_overlay(id, solid(2, 2, [0; 4]), georef).unwrap();
        assert!(matches!(
            view.attach_overlay(id, solid(2, 2, [0; 4]), georef),
            Err(ViewError::Attach(_))
        ));
    }

    #[test]
    fn test_overlay_placed_by_georeference() {
        let view = view();
        // Covers the upper-left quarter of the view.
        let georef = Georeference::new(
            Extent::new(0.0, 50.0, 50.0, 100.0, 3857),
            ViewSize::new(2, 2),
        );
        view.attach_overlay(OverlayId::new(1), solid(2, 2, [0, 255, 255, 255]), georef)
            .unwrap();

        let canvas = view.render().unwrap();
        assert_eq!(canvas.get_pixel(1, 1), &Rgba([0, 255, 255, 255]));
        assert_eq!(canvas.get_pixel(8, 8), &Rgba([0, 0, 0, 0]));
    }

    /// Left half red, right half blue.
    fn split(width: u32, height: u32) -> Arc<RgbaImage> {
        Arc::new(RgbaImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        }))
    }

    #[test]
    fn test_overlay_partly_off_canvas() {
        let view = view();
        let georef = Georeference::new(view.view_state().extent.unwrap(), ViewSize::new(10, 10));
        view.attach_overlay(OverlayId::new(1), split(10, 10), georef)
            .unwrap();

        // Panned right by half a view; only the blue half remains, on the left.
        view.set_extent(Extent::new(50.0, 0.0, 150.0, 100.0, 3857));
        let canvas = view.render().unwrap();
        assert_eq!(canvas.get_pixel(2, 5), &Rgba([0, 0, 255, 255]));
        assert_eq!(canvas.get_pixel(7, 5), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_deep_zoom_scales_only_visible_part() {
        let view = view();
        let georef = Georeference::new(view.view_state().extent.unwrap(), ViewSize::new(10, 10));
        view.attach_overlay(OverlayId::new(1), split(10, 10), georef)
            .unwrap();

        // Unclipped, the overlay would be 1,000,000 pixels on a side.
        view.set_extent(Extent::new(0.0, 0.0, 0.001, 0.001, 3857));
        let canvas = view.render().unwrap();
        assert_eq!(canvas.dimensions(), (10, 10));
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(9, 9), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_extent_changes_are_broadcast() {
        let view = view();
        let mut rx = view.watch_view_state();
        view.set_extent(Extent::new(10.0, 10.0, 20.0, 20.0, 3857));

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().extent.unwrap().xmin, 10.0);
    }

    #[tokio::test]
    async fn test_when_layer_view() {
        let view = view();
        let georef = Georeference::new(view.view_state().extent.unwrap(), ViewSize::new(10, 10));
        assert_eq!(
            view.when_layer_view(OverlayId::new(3)).await,
            Err(ViewError::NotAttached(OverlayId::new(3)))
        );

        view.attach_overlay(OverlayId::new(3), solid(1, 1, [0; 4]), georef)
            .unwrap();
        assert!(view.when_layer_view(OverlayId::new(3)).await.is_ok());
    }

    #[tokio::test]
    async fn test_screenshot_is_png() {
        let view = view();
        let png = view.take_screenshot().await.unwrap();

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 10));
    }

    #[tokio::test]
    async fn test_screenshot_without_extent_fails() {
        let view = OffscreenView::new(ViewState::default());
        assert!(matches!(
            view.take_screenshot().await,
            Err(ViewError::Screenshot(_))
        ));
    }
}
