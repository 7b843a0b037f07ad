//! Image service errors.

use thiserror::Error;

/// Errors returned while talking to the image service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// Transport failure (connect, TLS, body read)
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Service answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Request exceeded the configured timeout
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Service URL could not be parsed
    #[error("invalid service URL '{0}'")]
    InvalidUrl(String),

    /// A request parameter could not be encoded
    #[error("failed to encode request parameter: {0}")]
    Encode(String),
}
