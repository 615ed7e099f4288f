//! Request/response logging middleware.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use ferry_core::{Error, Request, Response, Result};
use serde_json::Value;
use tower::{Layer, Service};
use tracing::{Instrument, Level, debug, info, span, warn};

/// Layer that adds request/response logging.
///
/// # Example
///
/// ```
/// use ferry::HyperClient;
/// use ferry::middleware::LoggingLayer;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let client = HyperClient::builder().layer(LoggingLayer::new()).build();
/// # drop(client);
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

/// Log level for the logging middleware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Headers, body sizes and the error titles of failed responses.
    Debug,
    /// One line per request and per response.
    #[default]
    Info,
}

impl LoggingLayer {
    /// Create a new logging layer with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging layer that logs at debug level.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }

    /// Level of the layer.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service that logs requests and responses.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

/// `title`/`detail` of each JSON:API error object of a body.
fn error_titles(body: &[u8]) -> Vec<String> {
    let Ok(document) = serde_json::from_slice::<Value>(body) else {
        return Vec::new();
    };
    document
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|error| {
                    error
                        .get("title")
                        .or_else(|| error.get("detail"))
                        .and_then(Value::as_str)
                        .map(ToString::to_string)
                })
                .collect()
        })
        .unwrap_or_default()
}

impl<S> Service<Request<Bytes>> for Logging<S>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let method = request.method();
        let url = request.url().to_string();
        let level = self.level;

        let span = span!(Level::INFO, "http_request", %method, %url);

        let mut inner = self.inner.clone();
        Box::pin(
            async move {
                let start = Instant::now();

                match level {
                    LogLevel::Debug => {
                        debug!(
                            headers = ?request.headers(),
                            body_len = request.body().map_or(0, Bytes::len),
                            "sending request"
                        );
                    }
                    LogLevel::Info => info!("sending request"),
                }

                let result = inner.call(request).await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) if response.is_success() || response.is_not_modified() => {
                        info!(status = response.status(), elapsed_ms, "request completed");
                    }
                    Ok(response) => {
                        let status = response.status();
                        if level == LogLevel::Debug {
                            let errors = error_titles(response.body());
                            debug!(status, ?errors, "error response");
                        }
                        if status == 422 {
                            info!(status, elapsed_ms, "request rejected as invalid");
                        } else {
                            warn!(status, elapsed_ms, "request failed with HTTP error");
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, elapsed_ms, "request failed");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}
