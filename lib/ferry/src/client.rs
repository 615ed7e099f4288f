//! HTTP transport using hyper-util.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use ferry_core::{Error, HttpClient, Request, Response, Result};
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower::Layer;
use tower::util::BoxCloneService;
use tower_service::Service;

use crate::config::{ClientConfig, ClientConfigBuilder};
use crate::connector::https_connector;
use crate::middleware::LoggingLayer;

// ============================================================================
// Type-Erased Service for Middleware Composition
// ============================================================================

/// Type-erased service for middleware composition.
pub type BoxedService = BoxCloneService<Request<Bytes>, Response<Bytes>, Error>;

/// Future type for Tower Service implementation.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send + 'static>>;

/// `BoxedService` behind a mutex, so the client is `Sync` as [`HttpClient`] requires.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, request: Request<Bytes>) -> ServiceFuture {
        let mut service = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        Box::pin(async move { service.call(request).await })
    }
}

// ============================================================================
// Raw Client
// ============================================================================

#[derive(Clone)]
struct RawHyperClient {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    timeout: Duration,
}

impl RawHyperClient {
    fn new(config: &ClientConfig) -> Self {
        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(https_connector(config));

        Self {
            inner,
            timeout: config.timeout,
        }
    }

    fn build_hyper_request(request: Request<Bytes>) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, headers, body) = request.into_parts();

        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str());

        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder
            .body(body.map_or_else(Full::default, Full::new))
            .map_err(|e| Error::invalid_request(e.to_string()))
    }

    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let hyper_request = Self::build_hyper_request(request)?;

        let response = tokio::time::timeout(self.timeout, self.inner.request(hyper_request))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(Self::map_hyper_error)?;

        let status = response.status().as_u16();
        let headers = Self::extract_headers(response.headers());

        let body = tokio::time::timeout(self.timeout, response.into_body().collect())
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(|e| Error::connection(e.to_string()))?
            .to_bytes();

        Ok(Response::new(status, headers, body))
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let message = err.to_string();
        if is_tls_failure(&err) {
            Error::tls(message)
        } else {
            Error::connection(message)
        }
    }
}

/// Whether a rustls error sits anywhere in the source chain.
///
/// `io::Error` hides a custom payload from `source()`, so it is unwrapped
/// explicitly.
fn is_tls_failure(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(error) = current {
        if error.is::<rustls::Error>() {
            return true;
        }
        if let Some(io) = error.downcast_ref::<std::io::Error>()
            && io.get_ref().is_some_and(|inner| inner.is::<rustls::Error>())
        {
            return true;
        }
        current = error.source();
    }
    false
}

impl Service<Request<Bytes>> for RawHyperClient {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.execute(request).await })
    }
}

// ============================================================================
// Public Client
// ============================================================================

/// Pooled HTTP/1.1 and HTTP/2 transport over rustls, with tower middleware.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use ferry::HyperClient;
///
/// let client = HyperClient::builder()
///     .timeout(Duration::from_secs(10))
///     .with_logging()
///     .build();
/// # drop(client);
/// ```
#[derive(Clone)]
pub struct HyperClient {
    service: SyncService,
    config: ClientConfig,
}

impl std::fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperClient {
    /// Create a new client with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration and no middleware.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let raw = RawHyperClient::new(&config);
        Self {
            service: SyncService::new(BoxCloneService::new(raw)),
            config,
        }
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> HyperClientBuilder {
        HyperClientBuilder::default()
    }

    /// Get the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for HyperClient {
    async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        self.service.call(request).await
    }
}

impl Service<Request<Bytes>> for HyperClient {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        self.service.call(request)
    }
}

type LayerFn = Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>;

/// Builder for [`HyperClient`].
#[derive(Default)]
pub struct HyperClientBuilder {
    config: ClientConfigBuilder,
    layers: Vec<LayerFn>,
}

impl std::fmt::Debug for HyperClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClientBuilder")
            .field("config", &self.config)
            .field("layers_count", &self.layers.len())
            .finish()
    }
}

impl HyperClientBuilder {
    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Add a Tower layer to the client.
    ///
    /// Layers are applied in order: first added = innermost.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Request<Bytes>>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    /// Alias of [`layer`](Self::layer).
    #[must_use]
    pub fn with<L>(self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Request<Bytes>>>::Future: Send,
    {
        self.layer(layer)
    }

    /// Log every request at info level.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Log every request at debug level, headers and JSON:API errors included.
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    /// Build the client with all configured middleware.
    #[must_use]
    pub fn build(self) -> HyperClient {
        let config = self.config.build();
        let mut service: BoxedService = BoxCloneService::new(RawHyperClient::new(&config));

        for layer_fn in self.layers {
            service = layer_fn(service);
        }

        HyperClient {
            service: SyncService::new(service),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use ferry_core::Method;

    use super::*;

    #[tokio::test]
    async fn client_default() {
        let client = HyperClient::new();
        assert_eq!(client.config().timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn client_builder() {
        let client = HyperClient::builder()
            .timeout(Duration::from_secs(60))
            .pool_idle_per_host(16)
            .with_logging()
            .build();

        assert_eq!(client.config().timeout, Duration::from_secs(60));
        assert_eq!(client.config().pool_idle_per_host, 16);
    }

    #[tokio::test]
    async fn builder_is_debug() {
        let builder = HyperClient::builder().with_debug_logging();
        let debug = format!("{builder:?}");
        assert!(debug.contains("layers_count: 1"));
    }

    #[tokio::test]
    async fn refused_connection_is_a_connection_error() {
        let client = HyperClient::builder()
            .connect_timeout(Duration::from_secs(2))
            .build();
        let url = url::Url::parse("http://127.0.0.1:9/posts").expect("url");

        let result = client.execute(Request::builder(Method::Get, url).build()).await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    #[test]
    fn tls_failures_are_found_in_the_source_chain() {
        let tls = std::io::Error::other(rustls::Error::General("bad certificate".into()));
        assert!(is_tls_failure(&tls));

        let refused = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        assert!(!is_tls_failure(&refused));
    }
}
