//! HTTP client abstraction for testability

use super::error::ServiceError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("scenelayer/", env!("CARGO_PKG_VERSION"));

/// Trait for asynchronous HTTP client operations.
///
/// Lets the export pipeline run against a mock transport in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The fully encoded URL to request
    ///
    /// # Returns
    ///
    /// The response body as bytes, or an error for transport failures and
    /// non-success status codes.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ServiceError>> + Send;
}

/// Async HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl AsyncReqwestClient {
    /// Creates a new client with the default timeout.
    pub fn new() -> Result<Self, ServiceError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new client with a custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, ServiceError> {
        Self::build(Some(Duration::from_secs(timeout_secs)))
    }

    /// Creates a client whose requests are bounded only by cancellation.
    pub fn without_timeout() -> Result<Self, ServiceError> {
        Self::build(None)
    }

    /// Creates a client with `timeout`, or none at all.
    pub fn build(timeout: Option<Duration>) -> Result<Self, ServiceError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            ServiceError::HttpError(format!("Failed to create async HTTP client: {}", e))
        })?;

        Ok(Self { client, timeout })
    }

    /// Request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ServiceError> {
        trace!(url = url, "HTTP GET request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => {
                debug!(
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(ServiceError::HttpError(format!("Request failed: {}", e)));
            }
        };

        // Check HTTP status
        if !response.status().is_success() {
            let status = response.status().as_u16();
            warn!(status = status, "HTTP error status");
            return Err(ServiceError::HttpStatus {
                status,
                url: strip_query(url).to_string(),
            });
        }

        match response.bytes().await {
            Ok(bytes) => {
                trace!(bytes = bytes.len(), "HTTP response body read");
                Ok(bytes.to_vec())
            }
            Err(e) => {
                warn!(error = %e, "Failed to read response body");
                Err(ServiceError::HttpError(format!(
                    "Failed to read response: {}",
                    e
                )))
            }
        }
    }
}

/// Drops the query string so rule parameters do not end up in error messages.
fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Mock async HTTP client that records requested URLs.
    #[derive(Clone)]
    pub struct MockAsyncHttpClient {
        pub response: Result<Vec<u8>, ServiceError>,
        pub requests: Arc<Mutex<Vec<String>>>,
    }

    impl MockAsyncHttpClient {
        pub fn new(response: Result<Vec<u8>, ServiceError>) -> Self {
            Self {
                response,
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl AsyncHttpClient for MockAsyncHttpClient {
        async fn get(&self, url: &str) -> Result<Vec<u8>, ServiceError> {
            self.requests.lock().push(url.to_string());
            self.response.clone()
        }
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(
            strip_query("https://host/ImageServer/exportImage?bbox=1,2,3,4"),
            "https://host/ImageServer/exportImage"
        );
        assert_eq!(strip_query("https://host/a"), "https://host/a");
    }

    #[test]
    fn test_client_timeouts() {
        let default = AsyncReqwestClient::new().unwrap();
        assert_eq!(default.timeout(), Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)));

        let long = AsyncReqwestClient::with_timeout(300).unwrap();
        assert_eq!(long.timeout(), Some(Duration::from_secs(300)));

        let unbounded = AsyncReqwestClient::without_timeout().unwrap();
        assert_eq!(unbounded.timeout(), None);
    }

    #[tokio::test]
    async fn test_mock_async_client_records_requests() {
        let mock = MockAsyncHttpClient::new(Ok(vec![1, 2, 3, 4]));

        let result = mock.get("http://example.com/a").await;
        assert_eq!(result.unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(mock.requests.lock().as_slice(), ["http://example.com/a"]);
    }

    #[tokio::test]
    async fn test_mock_async_client_error() {
        let mock = MockAsyncHttpClient::new(Err(ServiceError::HttpError("Test error".into())));
        assert!(mock.get("http://example.com").await.is_err());
    }
}
