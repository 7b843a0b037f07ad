//! Cancellable image fetch pipeline.
//!
//! Each render creates a [`RenderJob`] with its own cancellation token.
//! Starting a new job cancels the one still in flight for the same overlay
//! slot, and a job's result is only applied through
//! [`ImageFetchPipeline::commit`], which re-checks the token under the same
//! lock that issues new jobs. A superseded response therefore never reaches
//! the overlay, whether or not the transport honoured the cancellation.
//!
//! ```text
//! fetch() ──► begin job (cancel previous) ──► exportImage ──► decode ──► FetchedImage
//!                                                                            │
//!                         commit(): token still current? ──► apply (overlay swap)
//! ```

mod error;
mod job;
mod pipeline;

pub use error::RenderError;
pub use job::{FetchedImage, JobId, RenderJob};
pub use pipeline::{FetchConfig, ImageFetchPipeline};
