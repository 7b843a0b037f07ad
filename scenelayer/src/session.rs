//! One map view's render loop.
//!
//! A [`RenderSession`] ties the pipeline together: a selection change builds
//! the rendering and mosaic rules, [`RenderSession::render`] fetches and
//! swaps the overlay, and a pending capture for the selected renderer is run
//! once the new overlay is on screen. Extent changes re-enter at the fetch
//! step with the same rules.

use crate::blob::BlobRegistry;
use crate::capture::{CaptureConfig, CaptureCoordinator, CaptureError, CaptureState};
use crate::fetch::{FetchConfig, ImageFetchPipeline, RenderError};
use crate::mosaic::{build_mosaic_rule, CompositeMethod, MosaicRule, SceneSelection};
use crate::overlay::OverlayLayerManager;
use crate::registry::{RegistryError, RendererId, RendererRegistry, ThumbnailRef};
use crate::rendering_rule::{presets, RasterFunction};
use crate::service::ImageService;
use crate::storage::ThumbnailStore;
use crate::view::{MapView, OverlayId};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The renderer a selection is drawn with.
#[derive(Debug, Clone, PartialEq)]
pub enum RendererChoice {
    /// A built-in preset, or any function template the service publishes
    Preset(String),
    /// A renderer from the [`RendererRegistry`]
    Custom(RendererId),
}

impl RendererChoice {
    pub fn preset(name: impl Into<String>) -> Self {
        RendererChoice::Preset(name.into())
    }

    /// Resolves the rendering rule for this renderer.
    ///
    /// Unknown preset names are sent as a named function template.
    pub fn rendering_rule(&self, registry: &RendererRegistry) -> Result<Value, RegistryError> {
        match self {
            RendererChoice::Preset(name) => Ok(presets::preset(name)
                .unwrap_or_else(|| RasterFunction::named(name.as_str()))
                .into_value()),
            RendererChoice::Custom(id) => registry
                .get(id)
                .map(|renderer| renderer.rendering_rule)
                .ok_or_else(|| RegistryError::UnknownRenderer(id.clone())),
        }
    }
}

impl fmt::Display for RendererChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RendererChoice::Preset(name) => write!(f, "preset:{}", name),
            RendererChoice::Custom(id) => write!(f, "custom:{}", id),
        }
    }
}

#[derive(Debug, Clone)]
struct RenderParams {
    renderer: RendererChoice,
    rendering_rule: Value,
    mosaic_rule: MosaicRule,
}

/// Result of one [`RenderSession::render`] call.
#[derive(Debug)]
pub enum RenderOutcome {
    /// Nothing selected or the view is not laid out yet
    Skipped,
    /// A newer render started first; the overlay is unchanged
    Superseded,
    /// The new image is on screen
    Displayed {
        overlay: OverlayId,
        /// Result of the capture run, if one was pending for this renderer
        capture: Option<Result<ThumbnailRef, CaptureError>>,
    },
}

/// Renders the current selection into a view's overlay slot.
pub struct RenderSession<S, V: MapView, T> {
    view: Arc<V>,
    pipeline: ImageFetchPipeline<S>,
    overlay: Mutex<OverlayLayerManager<V>>,
    registry: Arc<RendererRegistry>,
    capture: CaptureCoordinator<V, T>,
    params: RwLock<Option<RenderParams>>,
}

impl<S, V, T> RenderSession<S, V, T>
where
    S: ImageService + 'static,
    V: MapView + 'static,
    T: ThumbnailStore + 'static,
{
    pub fn new(
        view: Arc<V>,
        service: S,
        store: T,
        registry: Arc<RendererRegistry>,
        fetch_config: FetchConfig,
        capture_config: CaptureConfig,
    ) -> Self {
        Self {
            pipeline: ImageFetchPipeline::new(service, fetch_config),
            overlay: Mutex::new(OverlayLayerManager::new(Arc::clone(&view))),
            capture: CaptureCoordinator::new(
                Arc::clone(&view),
                store,
                Arc::clone(&registry),
                capture_config,
            ),
            view,
            registry,
            params: RwLock::new(None),
        }
    }

    pub fn view(&self) -> &Arc<V> {
        &self.view
    }

    pub fn registry(&self) -> &Arc<RendererRegistry> {
        &self.registry
    }

    pub fn blobs(&self) -> &Arc<BlobRegistry> {
        self.pipeline.blobs()
    }

    pub fn overlay_id(&self) -> Option<OverlayId> {
        self.overlay.lock().active_id()
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture.state()
    }

    /// Rules the next render will use.
    pub fn current_rules(&self) -> Option<(Value, MosaicRule)> {
        self.params
            .read()
            .as_ref()
            .map(|params| (params.rendering_rule.clone(), params.mosaic_rule.clone()))
    }

    /// Sets the scenes, composite method and renderer to draw.
    ///
    /// An empty selection cancels any render in flight and removes the
    /// overlay. Call [`render`](Self::render) to apply a new selection.
    pub fn select(
        &self,
        scenes: &SceneSelection,
        method: Option<CompositeMethod>,
        renderer: RendererChoice,
    ) -> Result<(), RegistryError> {
        let rendering_rule = renderer.rendering_rule(&self.registry)?;

        let Some(mosaic_rule) = build_mosaic_rule(scenes, method) else {
            debug!("Empty scene selection, clearing overlay");
            *self.params.write() = None;
            self.teardown();
            return Ok(());
        };

        debug!(
            renderer = %renderer,
            scenes = scenes.len(),
            composite = mosaic_rule.is_composite(),
            "Selection changed"
        );
        *self.params.write() = Some(RenderParams {
            renderer,
            rendering_rule,
            mosaic_rule,
        });
        Ok(())
    }

    /// Fetches the current selection for the current view and displays it.
    ///
    /// Network and decode failures are returned and leave the previous
    /// overlay on screen. Being superseded is not an error.
    pub async fn render(&self) -> Result<RenderOutcome, RenderError> {
        let Some(params) = self.params.read().clone() else {
            return Ok(RenderOutcome::Skipped);
        };
        let view_state = self.view.view_state();

        let fetched = match self
            .pipeline
            .fetch(&view_state, &params.rendering_rule, &params.mosaic_rule)
            .await
        {
            Ok(Some(fetched)) => fetched,
            Ok(None) => return Ok(RenderOutcome::Skipped),
            Err(RenderError::Canceled) => {
                debug!(renderer = %params.renderer, "Render superseded");
                return Ok(RenderOutcome::Superseded);
            }
            Err(e) => return Err(e),
        };

        let job = fetched.job.id();
        let swapped = self
            .pipeline
            .commit(fetched, |image, georeference| {
                self.overlay.lock().swap(image, georeference)
            });
        let overlay = match swapped {
            Ok(Ok(overlay)) => overlay,
            Ok(Err(e)) => {
                warn!(job = %job, error = %e, "Overlay swap failed, keeping previous image");
                return Err(e.into());
            }
            Err(RenderError::Canceled) => {
                debug!(job = %job, "Render superseded before display");
                return Ok(RenderOutcome::Superseded);
            }
            Err(e) => return Err(e),
        };
        debug!(job = %job, overlay = %overlay, "Render displayed");

        // A renderer registered while another capture was pending asks again
        // here, now that the slot may be free.
        let capture = match &params.renderer {
            RendererChoice::Custom(id) if self.registry.request_missing_thumbnail(id) => {
                self.capture.run(id, overlay).await
            }
            _ => None,
        };

        Ok(RenderOutcome::Displayed { overlay, capture })
    }

    /// Re-renders on every view change until `shutdown` fires, then tears
    /// the overlay down.
    pub async fn run_extent_loop(self: Arc<Self>, shutdown: CancellationToken) {
        let mut changes = self.view.watch_view_state();
        changes.mark_unchanged();
        let mut renders = JoinSet::new();
        info!("Extent loop started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = changes.changed() => {
                    if changed.is_err() {
                        debug!("View dropped its state channel");
                        break;
                    }
                    let session = Arc::clone(&self);
                    renders.spawn(async move { session.render().await });
                }
                Some(joined) = renders.join_next(), if !renders.is_empty() => {
                    if let Ok(Err(e)) = joined {
                        debug!(error = %e, "Extent render failed");
                    }
                }
            }
        }

        self.pipeline.cancel();
        renders.shutdown().await;
        self.teardown();
        info!("Extent loop stopped");
    }

    /// Cancels any render in flight and removes the overlay.
    pub fn teardown(&self) {
        self.pipeline.cancel();
        self.overlay.lock().teardown();
    }
}
