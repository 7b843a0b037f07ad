//! Remote raster image service.
//!
//! The service renders imagery on request through its `exportImage`
//! endpoint. [`ExportImageService`] assembles the request from a view extent,
//! output size and the two rule parameters, and sends it through an
//! [`AsyncHttpClient`].
//!
//! ```ignore
//! use scenelayer::service::{AsyncReqwestClient, ExportImageService};
//!
//! let client = AsyncReqwestClient::new()?;
//! let service = ExportImageService::new(client, DEFAULT_SERVICE_URL);
//! let bytes = service.export_image(&request).await?;
//! ```

mod error;
mod export;
mod http;

pub use error::ServiceError;
pub use export::{
    ExportImageRequest, ExportImageService, ImageService, DEFAULT_FORMAT, DEFAULT_SERVICE_URL,
};
pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_TIMEOUT_SECS};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
