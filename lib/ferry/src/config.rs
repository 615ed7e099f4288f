//! Adapter and transport configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

// ============================================================================
// Adapter Configuration
// ============================================================================

/// Default limit on the length of a coalesced `findMany` URL.
pub const DEFAULT_MAX_URL_LENGTH: usize = 2048;

/// Default origin against which root-relative URLs are resolved.
pub const DEFAULT_ORIGIN: &str = "http://localhost/";

/// Configuration of an [`Adapter`](crate::Adapter).
///
/// Deserializes from camelCase JSON:
///
/// ```
/// use ferry::AdapterConfig;
///
/// let config: AdapterConfig = serde_json::from_str(
///     r#"{"namespace": "api/v1", "coalesceFindRequests": true, "maxURLLength": 1024}"#,
/// ).expect("config");
/// assert!(config.coalesce_find_requests);
/// assert!(!config.supports_json_api_fields);
/// assert_eq!(config.max_url_length, 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdapterConfig {
    /// Origin prepended to every URL.
    pub host: Option<String>,
    /// Path prefix between host and resource path.
    pub namespace: Option<String>,
    /// Batch `findRecord` calls of one tick into `findMany` requests.
    pub coalesce_find_requests: bool,
    /// Track requested sparse fields and skip covered reloads.
    #[serde(rename = "supportsJSONAPIFields")]
    pub supports_json_api_fields: bool,
    /// Longest URL a coalesced request may produce.
    #[serde(rename = "maxURLLength")]
    pub max_url_length: usize,
    /// Extra headers sent with every request.
    pub headers: BTreeMap<String, String>,
    /// Origin used to resolve URLs when no host is configured.
    pub origin: String,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            host: None,
            namespace: None,
            coalesce_find_requests: false,
            supports_json_api_fields: false,
            max_url_length: DEFAULT_MAX_URL_LENGTH,
            headers: BTreeMap::new(),
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

impl AdapterConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> AdapterConfigBuilder {
        AdapterConfigBuilder::default()
    }
}

/// Builder for [`AdapterConfig`].
#[derive(Debug, Clone, Default)]
pub struct AdapterConfigBuilder {
    host: Option<String>,
    namespace: Option<String>,
    coalesce_find_requests: Option<bool>,
    supports_json_api_fields: Option<bool>,
    max_url_length: Option<usize>,
    headers: BTreeMap<String, String>,
    origin: Option<String>,
}

impl AdapterConfigBuilder {
    /// Set the host, e.g. `https://api.example.com`.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the namespace, e.g. `api/v1`.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Enable or disable request coalescing.
    #[must_use]
    pub const fn coalesce_find_requests(mut self, enabled: bool) -> Self {
        self.coalesce_find_requests = Some(enabled);
        self
    }

    /// Enable or disable sparse field tracking.
    #[must_use]
    pub const fn supports_json_api_fields(mut self, enabled: bool) -> Self {
        self.supports_json_api_fields = Some(enabled);
        self
    }

    /// Set the longest URL a coalesced request may produce.
    #[must_use]
    pub const fn max_url_length(mut self, length: usize) -> Self {
        self.max_url_length = Some(length);
        self
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the origin used to resolve host-less URLs.
    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> AdapterConfig {
        let defaults = AdapterConfig::default();
        AdapterConfig {
            host: self.host,
            namespace: self.namespace,
            coalesce_find_requests: self
                .coalesce_find_requests
                .unwrap_or(defaults.coalesce_find_requests),
            supports_json_api_fields: self
                .supports_json_api_fields
                .unwrap_or(defaults.supports_json_api_fields),
            max_url_length: self.max_url_length.unwrap_or(defaults.max_url_length),
            headers: self.headers,
            origin: self.origin.unwrap_or(defaults.origin),
        }
    }
}

// ============================================================================
// Transport Configuration
// ============================================================================

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout duration.
    pub timeout: Duration,
    /// Connection timeout duration.
    pub connect_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_idle_per_host: usize,
    /// Idle connection timeout.
    pub pool_idle_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Set the request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            timeout: self.timeout.unwrap_or(defaults.timeout),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
        }
    }
}
