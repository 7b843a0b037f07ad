//! The fetch pipeline for one overlay slot.

use super::error::RenderError;
use super::job::{FetchedImage, JobId, RenderJob};
use crate::blob::BlobRegistry;
use crate::decode::{decode_image, DecodedImage};
use crate::geo::{Georeference, ViewState};
use crate::mosaic::MosaicRule;
use crate::rendering_rule::serialize_rendering_rule;
use crate::service::{ExportImageRequest, ImageService, ServiceError, DEFAULT_FORMAT};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Settings for export requests.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Output format requested from the service (`jpgpng`, `png`, `jpg`)
    pub format: String,
    /// Upper bound on a single request; `None` relies on cancellation alone
    pub timeout: Option<Duration>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_FORMAT.to_string(),
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

#[derive(Debug)]
struct InFlight {
    id: JobId,
    cancellation: CancellationToken,
}

/// Fetches rendered imagery for a single overlay slot.
///
/// At most one job is in flight at a time: [`fetch`](Self::fetch) cancels the
/// previous job before issuing a new request.
pub struct ImageFetchPipeline<S> {
    service: S,
    blobs: Arc<BlobRegistry>,
    config: FetchConfig,
    next_job: AtomicU64,
    in_flight: Mutex<Option<InFlight>>,
}

impl<S: ImageService> ImageFetchPipeline<S> {
    pub fn new(service: S, config: FetchConfig) -> Self {
        Self {
            service,
            blobs: BlobRegistry::new(),
            config,
            next_job: AtomicU64::new(0),
            in_flight: Mutex::new(None),
        }
    }

    /// Shares an existing registry instead of a private one.
    pub fn with_blob_registry(mut self, blobs: Arc<BlobRegistry>) -> Self {
        self.blobs = blobs;
        self
    }

    pub fn blobs(&self) -> &Arc<BlobRegistry> {
        &self.blobs
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Job currently in flight or awaiting commit.
    pub fn in_flight(&self) -> Option<JobId> {
        self.in_flight.lock().as_ref().map(|job| job.id)
    }

    /// Cancels the job in flight, if any. Returns true if one was cancelled.
    pub fn cancel(&self) -> bool {
        match self.in_flight.lock().take() {
            Some(job) => {
                job.cancellation.cancel();
                debug!(job = %job.id, "Render job cancelled");
                true
            }
            None => false,
        }
    }

    /// Fetches and decodes the image for the current view.
    ///
    /// Returns `Ok(None)` without issuing a request if the view has no
    /// extent or a zero-sized viewport. A job superseded while in flight
    /// resolves to [`RenderError::Canceled`] and its payload is discarded
    /// without being decoded.
    pub async fn fetch(
        &self,
        view: &ViewState,
        rendering_rule: &Value,
        mosaic_rule: &MosaicRule,
    ) -> Result<Option<FetchedImage>, RenderError> {
        let Some((extent, size)) = view.renderable() else {
            debug!("View not laid out, skipping fetch");
            return Ok(None);
        };

        let mosaic_json = mosaic_rule
            .to_json()
            .map_err(|e| ServiceError::Encode(e.to_string()))?;
        let request = ExportImageRequest {
            extent,
            size,
            format: self.config.format.clone(),
            mosaic_rule: mosaic_json,
            rendering_rule: serialize_rendering_rule(rendering_rule),
        };

        let job = self.begin(request);
        debug!(
            job = %job.id,
            scenes = mosaic_rule.scene_ids().len(),
            composite = mosaic_rule.is_composite(),
            size = %size,
            "Render job started"
        );

        match self.run(&job).await {
            Ok(image) => Ok(Some(FetchedImage {
                job,
                image,
                georeference: Georeference::new(extent, size),
            })),
            Err(RenderError::Canceled) => {
                debug!(job = %job.id, "Render job resolved after cancellation, discarded");
                Err(RenderError::Canceled)
            }
            Err(e) => {
                self.finish(job.id);
                warn!(job = %job.id, error = %e, "Render job failed");
                Err(e)
            }
        }
    }

    /// Applies a fetched image if its job is still the current one.
    ///
    /// `apply` runs while new jobs are blocked from starting, so a job that is
    /// current at the check is current when applied. A stale image is dropped
    /// (releasing its buffer) and `Canceled` returned.
    pub fn commit<F, R>(&self, fetched: FetchedImage, apply: F) -> Result<R, RenderError>
    where
        F: FnOnce(DecodedImage, Georeference) -> R,
    {
        let mut slot = self.in_flight.lock();
        let current = slot
            .as_ref()
            .is_some_and(|in_flight| in_flight.id == fetched.job.id);

        if !current || fetched.job.is_canceled() {
            debug!(job = %fetched.job.id, "Stale render result dropped at commit");
            return Err(RenderError::Canceled);
        }

        slot.take();
        Ok(apply(fetched.image, fetched.georeference))
    }

    fn begin(&self, request: ExportImageRequest) -> RenderJob {
        let id = JobId(self.next_job.fetch_add(1, Ordering::Relaxed) + 1);
        let cancellation = CancellationToken::new();

        let mut slot = self.in_flight.lock();
        if let Some(previous) = slot.replace(InFlight {
            id,
            cancellation: cancellation.clone(),
        }) {
            previous.cancellation.cancel();
            debug!(job = %previous.id, superseded_by = %id, "Render job superseded");
        }

        RenderJob {
            id,
            cancellation,
            request,
        }
    }

    fn finish(&self, id: JobId) {
        let mut slot = self.in_flight.lock();
        if slot.as_ref().is_some_and(|in_flight| in_flight.id == id) {
            slot.take();
        }
    }

    async fn run(&self, job: &RenderJob) -> Result<DecodedImage, RenderError> {
        let response = tokio::select! {
            biased;
            _ = job.cancellation.cancelled() => return Err(RenderError::Canceled),
            response = self.export(&job.request) => response,
        };

        if job.is_canceled() {
            return Err(RenderError::Canceled);
        }
        let image = decode_image(response?, &self.blobs).await?;

        if job.is_canceled() {
            return Err(RenderError::Canceled);
        }
        Ok(image)
    }

    async fn export(&self, request: &ExportImageRequest) -> Result<Vec<u8>, ServiceError> {
        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, self.service.export_image(request))
                .await
                .map_err(|_| ServiceError::Timeout(limit))?,
            None => self.service.export_image(request).await,
        }
    }
}
