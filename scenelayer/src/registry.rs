//! Custom renderers, their thumbnails, and the pending capture flag.
//!
//! A custom renderer registered without a thumbnail gets a
//! [`PendingCapture`] so the next render with that renderer is
//! snapshotted. Only one capture may be pending process-wide; the flag lives
//! in a [`PendingCaptureSlot`] and is cleared by the capture coordinator on
//! success or failure.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

/// Identifier of a custom renderer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RendererId(String);

impl RendererId {
    pub fn new(id: impl Into<String>) -> Self {
        RendererId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RendererId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RendererId {
    fn from(id: &str) -> Self {
        RendererId::new(id)
    }
}

impl From<String> for RendererId {
    fn from(id: String) -> Self {
        RendererId(id)
    }
}

/// A captured thumbnail as recorded in the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailRef {
    pub renderer_id: RendererId,
    /// Where the thumbnail is (or will be) persisted
    pub location: String,
    /// Encoded PNG bytes
    pub encoded: Arc<[u8]>,
    pub captured_at: DateTime<Utc>,
}

/// A user-defined renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomRenderer {
    pub id: RendererId,
    pub name: String,
    pub rendering_rule: Value,
    pub thumbnail: Option<ThumbnailRef>,
}

impl CustomRenderer {
    pub fn new(id: impl Into<RendererId>, name: impl Into<String>, rendering_rule: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rendering_rule,
            thumbnail: None,
        }
    }

    pub fn has_thumbnail(&self) -> bool {
        self.thumbnail.is_some()
    }
}

/// A request to snapshot the next render of a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCapture {
    pub renderer_id: RendererId,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("unknown renderer: {0}")]
    UnknownRenderer(RendererId),
}

/// Holder of the single process-wide pending capture.
pub struct PendingCaptureSlot {
    tx: watch::Sender<Option<PendingCapture>>,
}

impl Default for PendingCaptureSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingCaptureSlot {
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(None),
        }
    }

    /// Sets the pending capture if none is live. Returns true if set.
    pub fn try_request(&self, renderer_id: RendererId) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            debug!(renderer = %renderer_id, "Capture requested");
            *slot = Some(PendingCapture {
                renderer_id,
                requested_at: Utc::now(),
            });
            true
        })
    }

    /// Waits for the live capture (if any) to resolve, then sets a new one.
    pub async fn request(&self, renderer_id: RendererId) {
        let mut rx = self.tx.subscribe();
        loop {
            if self.try_request(renderer_id.clone()) {
                return;
            }
            // The sender lives as long as `self`, so this cannot fail.
            let _ = rx.wait_for(Option::is_none).await;
        }
    }

    pub fn current(&self) -> Option<PendingCapture> {
        self.tx.borrow().clone()
    }

    /// True if the pending capture is for `renderer_id`.
    pub fn is_pending_for(&self, renderer_id: &RendererId) -> bool {
        self.tx
            .borrow()
            .as_ref()
            .is_some_and(|pending| &pending.renderer_id == renderer_id)
    }

    /// Clears the pending capture if it belongs to `renderer_id`.
    pub fn clear_for(&self, renderer_id: &RendererId) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot
                .as_ref()
                .is_some_and(|pending| &pending.renderer_id == renderer_id)
            {
                *slot = None;
                true
            } else {
                false
            }
        })
    }

    pub fn clear(&self) {
        self.tx.send_if_modified(|slot| slot.take().is_some());
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PendingCapture>> {
        self.tx.subscribe()
    }
}

/// In-memory registry of custom renderers.
#[derive(Default)]
pub struct RendererRegistry {
    renderers: RwLock<BTreeMap<RendererId, CustomRenderer>>,
    pending: PendingCaptureSlot,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a renderer.
    ///
    /// Requests a capture if the renderer has no thumbnail and no other
    /// capture is pending; returns whether one was requested. A renderer
    /// turned away here gets its capture from
    /// [`request_missing_thumbnail`](Self::request_missing_thumbnail) once
    /// the live one resolves.
    pub fn register(&self, renderer: CustomRenderer) -> bool {
        let id = renderer.id.clone();
        let needs_thumbnail = !renderer.has_thumbnail();

        let replaced = self.renderers.write().insert(id.clone(), renderer).is_some();
        debug!(renderer = %id, replaced, "Custom renderer registered");

        needs_thumbnail && self.pending.try_request(id)
    }

    /// Requests a capture for `id` if it is registered without a thumbnail
    /// and the slot is free. Returns true if a capture is now pending for it.
    pub fn request_missing_thumbnail(&self, id: &RendererId) -> bool {
        let missing = self
            .renderers
            .read()
            .get(id)
            .is_some_and(|renderer| !renderer.has_thumbnail());
        if !missing {
            return false;
        }
        self.pending.try_request(id.clone()) || self.pending.is_pending_for(id)
    }

    pub fn get(&self, id: &RendererId) -> Option<CustomRenderer> {
        self.renderers.read().get(id).cloned()
    }

    pub fn list(&self) -> Vec<CustomRenderer> {
        self.renderers.read().values().cloned().collect()
    }

    /// Removes a renderer, dropping its pending capture if any.
    pub fn remove(&self, id: &RendererId) -> Option<CustomRenderer> {
        let removed = self.renderers.write().remove(id);
        if removed.is_some() {
            self.pending.clear_for(id);
        }
        removed
    }

    pub fn renderers_missing_thumbnails(&self) -> Vec<RendererId> {
        self.renderers
            .read()
            .values()
            .filter(|renderer| !renderer.has_thumbnail())
            .map(|renderer| renderer.id.clone())
            .collect()
    }

    /// Records a captured thumbnail against its renderer.
    pub fn record_thumbnail(&self, thumbnail: ThumbnailRef) -> Result<(), RegistryError> {
        let mut renderers = self.renderers.write();
        let renderer = renderers
            .get_mut(&thumbnail.renderer_id)
            .ok_or_else(|| RegistryError::UnknownRenderer(thumbnail.renderer_id.clone()))?;

        info!(
            renderer = %thumbnail.renderer_id,
            bytes = thumbnail.encoded.len(),
            "Thumbnail recorded"
        );
        renderer.thumbnail = Some(thumbnail);
        Ok(())
    }

    pub fn pending(&self) -> &PendingCaptureSlot {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering_rule::RasterFunction;
    use std::time::Duration;

    fn renderer(id: &str) -> CustomRenderer {
        CustomRenderer::new(id, format!("Renderer {}", id), RasterFunction::named("NDVI").into_value())
    }

    fn thumbnail(id: &str) -> ThumbnailRef {
        ThumbnailRef {
            renderer_id: RendererId::new(id),
            location: format!("/tmp/{}.png", id),
            encoded: Arc::from(vec![1u8, 2, 3]),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn test_register_requests_capture_once() {
        let registry = RendererRegistry::new();

        assert!(registry.register(renderer("a")));
        assert!(!registry.register(renderer("b")));

        let pending = registry.pending().current().unwrap();
        assert_eq!(pending.renderer_id, RendererId::new("a"));
        assert_eq!(
            registry.renderers_missing_thumbnails(),
            vec![RendererId::new("a"), RendererId::new("b")]
        );
    }

    #[test]
    fn test_register_with_thumbnail_skips_capture() {
        let registry = RendererRegistry::new();
        let mut with_thumb = renderer("a");
        with_thumb.thumbnail = Some(thumbnail("a"));

        assert!(!registry.register(with_thumb));
        assert!(registry.pending().current().is_none());
        assert!(registry.renderers_missing_thumbnails().is_empty());
    }

    #[test]
    fn test_record_thumbnail() {
        let registry = RendererRegistry::new();
        registry.register(renderer("a"));

        registry.record_thumbnail(thumbnail("a")).unwrap();
        assert!(registry.get(&RendererId::new("a")).unwrap().has_thumbnail());

        assert_eq!(
            registry.record_thumbnail(thumbnail("zzz")),
            Err(RegistryError::UnknownRenderer(RendererId::new("zzz")))
        );
    }

    #[test]
    fn test_turned_away_renderer_requested_after_slot_frees() {
        let registry = RendererRegistry::new();
        let a = RendererId::new("a");
        let b = RendererId::new("b");
        registry.register(renderer("a"));
        registry.register(renderer("b"));

        // Slot still held by `a`
        assert!(!registry.request_missing_thumbnail(&b));
        assert!(registry.request_missing_thumbnail(&a));

        registry.record_thumbnail(thumbnail("a")).unwrap();
        registry.pending().clear_for(&a);
        assert!(!registry.request_missing_thumbnail(&a));
        assert!(registry.request_missing_thumbnail(&b));
        assert!(registry.pending().is_pending_for(&b));

        assert!(!registry.request_missing_thumbnail(&RendererId::new("zzz")));
    }

    #[test]
    fn test_remove_clears_its_pending_capture() {
        let registry = RendererRegistry::new();
        registry.register(renderer("a"));

        assert!(registry.remove(&RendererId::new("a")).is_some());
        assert!(registry.pending().current().is_none());
        assert!(registry.remove(&RendererId::new("a")).is_none());
    }

    #[test]
    fn test_clear_for_other_renderer_is_noop() {
        let slot = PendingCaptureSlot::new();
        assert!(slot.try_request(RendererId::new("a")));

        assert!(!slot.clear_for(&RendererId::new("b")));
        assert!(slot.is_pending_for(&RendererId::new("a")));
        assert!(slot.clear_for(&RendererId::new("a")));
        assert!(slot.current().is_none());
    }

    #[tokio::test]
    async fn test_request_waits_for_live_capture() {
        let slot = Arc::new(PendingCaptureSlot::new());
        assert!(slot.try_request(RendererId::new("a")));

        let waiter = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move { slot.request(RendererId::new("b")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(slot.is_pending_for(&RendererId::new("a")));

        slot.clear();
        waiter.await.unwrap();
        assert!(slot.is_pending_for(&RendererId::new("b")));
    }
}
