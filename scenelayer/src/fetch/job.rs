//! Render job bookkeeping.

use crate::decode::DecodedImage;
use crate::geo::Georeference;
use crate::service::ExportImageRequest;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Sequential identifier of a render job within one pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub(crate) u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "render-{}", self.0)
    }
}

/// One in-flight or completed fetch.
#[derive(Debug)]
pub struct RenderJob {
    pub(crate) id: JobId,
    pub(crate) cancellation: CancellationToken,
    pub(crate) request: ExportImageRequest,
}

impl RenderJob {
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn request(&self) -> &ExportImageRequest {
        &self.request
    }

    /// True once a newer job has superseded this one.
    pub fn is_canceled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// A decoded image waiting to be committed to the overlay slot.
///
/// Dropping it without committing releases the image's buffer.
#[derive(Debug)]
pub struct FetchedImage {
    pub job: RenderJob,
    pub image: DecodedImage,
    pub georeference: Georeference,
}
