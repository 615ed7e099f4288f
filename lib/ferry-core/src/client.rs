//! HTTP transport trait.
//!
//! The adapter only needs one thing from a transport: execute a request and
//! hand back the buffered response. Implement [`HttpClient`] to plug in a
//! custom transport or a test double.

use std::future::Future;

use bytes::Bytes;

use crate::{Request, Response, Result};

/// Core HTTP client trait.
///
/// Non-2xx statuses are not errors at this level: they come back as a
/// [`Response`] and are classified by the adapter.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// # Errors
    ///
    /// Returns an error only when no response was received:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}
