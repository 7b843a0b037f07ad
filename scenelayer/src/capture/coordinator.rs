//! Drives one capture run against the view, registry and store.

use super::error::CaptureError;
use super::state::{CaptureEvent, CaptureState};
use crate::registry::{PendingCaptureSlot, RendererId, RendererRegistry, ThumbnailRef};
use crate::storage::ThumbnailStore;
use crate::view::{MapView, OverlayId, ViewError};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, trace, warn};

/// Timing and ownership settings for captures.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Wait after convergence before the snapshot (default: 1s)
    pub settle_delay: Duration,
    /// Upper bound on waiting for the view to stop updating (default: 30s)
    pub convergence_timeout: Duration,
    /// Owner recorded with persisted thumbnails
    pub owner_id: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(1000),
            convergence_timeout: Duration::from_secs(30),
            owner_id: "anonymous".to_string(),
        }
    }
}

/// Clears the pending capture and fails the run when dropped, so neither
/// is left behind if the run errors or its future is dropped.
struct RunGuard<'a> {
    state: &'a watch::Sender<CaptureState>,
    pending: &'a PendingCaptureSlot,
    renderer_id: RendererId,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|state| {
            if state.is_active() {
                *state = CaptureState::Failed;
                true
            } else {
                false
            }
        });
        if self.pending.clear_for(&self.renderer_id) {
            trace!(renderer = %self.renderer_id, "Pending capture cleared");
        }
    }
}

/// Captures a thumbnail for the pending renderer once the view settles.
///
/// Runs are serialised: a second [`run`](Self::run) waits for the first to
/// resolve.
pub struct CaptureCoordinator<V, S> {
    view: Arc<V>,
    store: S,
    registry: Arc<RendererRegistry>,
    config: CaptureConfig,
    state: watch::Sender<CaptureState>,
    run_lock: Mutex<()>,
}

impl<V: MapView, S: ThumbnailStore> CaptureCoordinator<V, S> {
    pub fn new(
        view: Arc<V>,
        store: S,
        registry: Arc<RendererRegistry>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            view,
            store,
            registry,
            config,
            state: watch::Sender::new(CaptureState::Idle),
            run_lock: Mutex::new(()),
        }
    }

    pub fn state(&self) -> CaptureState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<CaptureState> {
        self.state.subscribe()
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Captures the view showing `overlay` as the thumbnail of `renderer_id`.
    ///
    /// Returns `None` if no capture is pending for that renderer. Otherwise
    /// the pending capture is cleared before this returns, whatever the
    /// outcome.
    pub async fn run(
        &self,
        renderer_id: &RendererId,
        overlay: OverlayId,
    ) -> Option<Result<ThumbnailRef, CaptureError>> {
        let _serial = self.run_lock.lock().await;
        let pending = self
            .registry
            .pending()
            .current()
            .filter(|pending| &pending.renderer_id == renderer_id)?;

        let _guard = RunGuard {
            state: &self.state,
            pending: self.registry.pending(),
            renderer_id: pending.renderer_id.clone(),
        };

        let result = self.capture(&pending.renderer_id, overlay).await;
        match &result {
            Ok(thumbnail) => info!(
                renderer = %thumbnail.renderer_id,
                location = %thumbnail.location,
                "Thumbnail captured"
            ),
            Err(e) => {
                let _ = self.advance(CaptureEvent::Fault);
                warn!(renderer = %pending.renderer_id, error = %e, "Thumbnail capture failed");
            }
        }
        Some(result)
    }

    async fn capture(
        &self,
        renderer_id: &RendererId,
        overlay: OverlayId,
    ) -> Result<ThumbnailRef, CaptureError> {
        self.advance(CaptureEvent::Start)?;
        self.view.when_layer_view(overlay).await?;
        self.advance(CaptureEvent::LayerAttached)?;

        self.await_convergence().await?;
        self.advance(CaptureEvent::Converged)?;

        tokio::time::sleep(self.config.settle_delay).await;
        self.advance(CaptureEvent::SettleElapsed)?;

        let encoded: Arc<[u8]> = self.view.take_screenshot().await?.into();
        let thumbnail = ThumbnailRef {
            renderer_id: renderer_id.clone(),
            location: self.store.location_for(renderer_id, &self.config.owner_id)?,
            encoded,
            captured_at: Utc::now(),
        };

        // In-memory first; a failed write below leaves the record in place.
        self.registry.record_thumbnail(thumbnail.clone())?;
        self.store
            .update_image(renderer_id, &thumbnail.encoded, &self.config.owner_id)
            .await?;

        self.advance(CaptureEvent::Captured)?;
        Ok(thumbnail)
    }

    async fn await_convergence(&self) -> Result<(), CaptureError> {
        let mut updating = self.view.watch_updating();
        let limit = self.config.convergence_timeout;

        let converged = tokio::time::timeout(limit, updating.wait_for(|updating| !*updating))
            .await
            .map(|signal| signal.is_ok());

        match converged {
            Ok(true) => Ok(()),
            Ok(false) => Err(ViewError::Unavailable.into()),
            Err(_) => Err(CaptureError::ConvergenceTimeout(limit)),
        }
    }

    fn advance(&self, event: CaptureEvent) -> Result<CaptureState, CaptureError> {
        let mut outcome = Ok(CaptureState::Idle);
        self.state.send_if_modified(|state| match state.on_event(event) {
            Some(next) => {
                debug!(from = %state, to = %next, "Capture state changed");
                *state = next;
                outcome = Ok(next);
                true
            }
            None => {
                outcome = Err(CaptureError::InvalidTransition {
                    state: *state,
                    event,
                });
                false
            }
        });
        outcome
    }
}
