//! Tower middleware for [`HyperClient`](crate::HyperClient).
//!
//! Layers wrap the transport below the adapter, so they see every request
//! the adapter dispatches, coalesced batches included. Any layer whose
//! service speaks `Request<Bytes>` / `Response<Bytes>` / [`Error`](ferry_core::Error)
//! can be added with [`HyperClientBuilder::layer`](crate::HyperClientBuilder::layer).
//!
//! - [`LoggingLayer`] - Logs requests and responses using `tracing`

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};
pub use tower::ServiceBuilder;
