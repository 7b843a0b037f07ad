//! `exportImage` request assembly.

use super::error::ServiceError;
use super::http::AsyncHttpClient;
use crate::geo::{Extent, ViewSize};
use reqwest::Url;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Landsat Level-2 imagery service used when no URL is configured.
pub const DEFAULT_SERVICE_URL: &str =
    "https://landsat.imagery1.arcgis.com/arcgis/rest/services/LandsatC2L2/ImageServer";

/// Default output format: JPEG where opaque, PNG where transparent.
pub const DEFAULT_FORMAT: &str = "jpgpng";

/// Parameters of one `exportImage` call.
///
/// Both rule parameters are already-encoded JSON strings; the rendering
/// rule must have been produced by
/// [`serialize_rendering_rule`](crate::rendering_rule::serialize_rendering_rule).
#[derive(Debug, Clone, PartialEq)]
pub struct ExportImageRequest {
    pub extent: Extent,
    pub size: ViewSize,
    pub format: String,
    pub mosaic_rule: String,
    pub rendering_rule: String,
}

impl ExportImageRequest {
    /// Query parameters in the order they are sent.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let wkid = self.extent.wkid.to_string();
        vec![
            ("bbox", self.extent.bbox_param()),
            ("bboxSR", wkid.clone()),
            ("imageSR", wkid),
            ("size", self.size.size_param()),
            ("format", self.format.clone()),
            ("mosaicRule", self.mosaic_rule.clone()),
            ("renderingRule", self.rendering_rule.clone()),
            ("f", "image".to_string()),
        ]
    }

    /// Builds the full request URL against `service_url`.
    pub fn to_url(&self, service_url: &str) -> Result<String, ServiceError> {
        let endpoint = format!("{}/exportImage", service_url.trim_end_matches('/'));
        let mut url =
            Url::parse(&endpoint).map_err(|_| ServiceError::InvalidUrl(service_url.to_string()))?;
        url.query_pairs_mut().extend_pairs(self.query_pairs());
        Ok(url.into())
    }
}

/// A service able to render an export request into an encoded image.
pub trait ImageService: Send + Sync {
    /// Renders `request` and returns the encoded image bytes.
    fn export_image(
        &self,
        request: &ExportImageRequest,
    ) -> impl Future<Output = Result<Vec<u8>, ServiceError>> + Send;
}

impl<T: ImageService> ImageService for Arc<T> {
    fn export_image(
        &self,
        request: &ExportImageRequest,
    ) -> impl Future<Output = Result<Vec<u8>, ServiceError>> + Send {
        (**self).export_image(request)
    }
}

/// [`ImageService`] backed by an ArcGIS-style image server.
pub struct ExportImageService<C> {
    client: C,
    service_url: String,
}

impl<C: AsyncHttpClient> ExportImageService<C> {
    pub fn new(client: C, service_url: impl Into<String>) -> Self {
        Self {
            client,
            service_url: service_url.into(),
        }
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }
}

impl<C: AsyncHttpClient> ImageService for ExportImageService<C> {
    async fn export_image(&self, request: &ExportImageRequest) -> Result<Vec<u8>, ServiceError> {
        let url = request.to_url(&self.service_url)?;
        debug!(
            bbox = %request.extent.bbox_param(),
            size = %request.size,
            "Requesting exportImage"
        );
        self.client.get(&url).await
    }
}
