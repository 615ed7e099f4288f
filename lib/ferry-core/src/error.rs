//! Error types for ferry.
//!
//! Every dispatched request is classified into a [`crate::ResponseOutcome`];
//! the failing outcomes surface to callers as [`Error::Invalid`] (HTTP 422) or
//! [`Error::Adapter`] (everything else, transport failures included).

use std::collections::BTreeMap;

use derive_more::{Display, Error, From};
use serde_json::Value;

use crate::ResourceType;

// ============================================================================
// Validation Error
// ============================================================================

/// Key of validation errors that do not point at an attribute.
const BASE: &str = "base";

/// The backend rejected a record as invalid (HTTP 422).
///
/// Carries the `errors` member of the response document verbatim; all other
/// content of the response body is discarded.
#[derive(Debug, Clone, PartialEq, Display, Error)]
#[display("the backend rejected the record as invalid ({} error(s))", errors.len())]
pub struct InvalidError {
    errors: Vec<Value>,
}

impl InvalidError {
    /// Create a validation error from a list of JSON:API error objects.
    #[must_use]
    pub fn new(errors: Vec<Value>) -> Self {
        Self { errors }
    }

    /// The JSON:API error objects, as sent by the backend.
    #[must_use]
    pub fn errors(&self) -> &[Value] {
        &self.errors
    }

    /// Group error messages by the wire key they point at.
    ///
    /// An error object is attributed through `source.pointer`
    /// (`/data/attributes/<key>` or `/data/relationships/<key>`); errors
    /// pointing at `/data` or without a pointer land under `base`. The message
    /// is `detail`, falling back to `title`.
    #[must_use]
    pub fn errors_by_key(&self) -> BTreeMap<String, Vec<String>> {
        self.errors_by_attribute_with(str::to_string)
    }

    /// Like [`errors_by_key`](Self::errors_by_key), with every wire key
    /// mapped to an attribute name by `attribute_of`. `base` is kept as is.
    #[must_use]
    pub fn errors_by_attribute_with(
        &self,
        mut attribute_of: impl FnMut(&str) -> String,
    ) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for error in &self.errors {
            let attribute = error
                .pointer("/source/pointer")
                .and_then(Value::as_str)
                .and_then(|pointer| {
                    pointer
                        .strip_prefix("/data/attributes/")
                        .or_else(|| pointer.strip_prefix("/data/relationships/"))
                })
                .filter(|key| !key.is_empty())
                .map_or_else(|| BASE.to_string(), &mut attribute_of);

            let message = error
                .get("detail")
                .or_else(|| error.get("title"))
                .and_then(Value::as_str)
                .unwrap_or_default();

            grouped
                .entry(attribute)
                .or_default()
                .push(message.to_string());
        }
        grouped
    }
}

// ============================================================================
// Adapter Error
// ============================================================================

/// Refinement of an [`AdapterError`] by status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum AdapterErrorKind {
    /// 401
    #[display("unauthorized")]
    Unauthorized,
    /// 403
    #[display("forbidden")]
    Forbidden,
    /// 404
    #[display("not found")]
    NotFound,
    /// 409
    #[display("conflict")]
    Conflict,
    /// 5xx
    #[display("server error")]
    Server,
    /// The transport gave up waiting for a response.
    #[display("timeout")]
    Timeout,
    /// The request never produced a response (connection or TLS failure).
    #[display("network error")]
    Network,
    /// Any other unexpected status.
    #[display("adapter error")]
    Other,
}

impl AdapterErrorKind {
    /// Kind for an HTTP status received from the backend.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            500..=599 => Self::Server,
            _ => Self::Other,
        }
    }
}

/// A server or transport fault for a dispatched request.
///
/// `status` is `0` when no response was received.
#[derive(Debug, Clone, PartialEq, Display, Error)]
#[display("{kind} ({status}): {detail}")]
pub struct AdapterError {
    status: u16,
    kind: AdapterErrorKind,
    detail: String,
    errors: Vec<Value>,
}

impl AdapterError {
    /// Create an adapter error for a response with the given status.
    #[must_use]
    pub fn new(status: u16, detail: impl Into<String>) -> Self {
        Self::with_kind(status, AdapterErrorKind::from_status(status), detail)
    }

    /// Create an adapter error with an explicit kind.
    #[must_use]
    pub fn with_kind(status: u16, kind: AdapterErrorKind, detail: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            detail: detail.into(),
            errors: Vec::new(),
        }
    }

    /// Attach the JSON:API error objects of the response.
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<Value>) -> Self {
        self.errors = errors;
        self
    }

    /// HTTP status, `0` for transport failures.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Status refinement.
    #[must_use]
    pub const fn kind(&self) -> AdapterErrorKind {
        self.kind
    }

    /// Human readable detail message.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// JSON:API error objects. When the backend did not send any, a single
    /// generic object describing the status is returned.
    #[must_use]
    pub fn errors(&self) -> Vec<Value> {
        if self.errors.is_empty() {
            vec![serde_json::json!({
                "status": self.status.to_string(),
                "title": "The backend responded with an error",
                "detail": self.detail,
            })]
        } else {
            self.errors.clone()
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for ferry operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// The backend answered 422.
    #[display("{_0}")]
    #[from]
    Invalid(InvalidError),

    /// The backend answered with any other failing status, or the transport failed.
    #[display("{_0}")]
    #[from]
    Adapter(AdapterError),

    /// A coalesced fetch whose id was absent from the batch response.
    #[display("no {resource_type} with id '{id}' in the batch response")]
    #[from(skip)]
    NotFound {
        /// Resource type of the missing record.
        resource_type: ResourceType,
        /// Missing id.
        id: String,
    },

    /// A coalesced fetch dropped before its batch was flushed.
    #[display("fetch of {resource_type} '{id}' was abandoned before flush")]
    #[from(skip)]
    Abandoned {
        /// Resource type of the abandoned record.
        resource_type: ResourceType,
        /// Abandoned id.
        id: String,
    },

    /// A successful response whose document could not be normalized.
    #[display("invalid payload: {_0}")]
    #[from(skip)]
    InvalidPayload(#[error(not(source))] String),

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "data.attributes").
        path: String,
        /// Error message.
        message: String,
    },

    /// Query string serialization error.
    #[display("query serialization error: {_0}")]
    #[from]
    QuerySerialization(serde_html_form::ser::Error),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an invalid payload error.
    #[must_use]
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` for validation failures (422).
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// Returns `true` if the record could not be found, either through a 404
    /// or because it was missing from a coalesced batch.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Adapter(error) => error.kind() == AdapterErrorKind::NotFound,
            _ => false,
        }
    }

    /// Returns the HTTP status code if a response was classified.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Invalid(_) => Some(422),
            Self::Adapter(error) => Some(error.status()),
            _ => None,
        }
    }

    /// Build a copy of the error that can be handed to another waiter.
    ///
    /// Classified errors are cloned as-is; the others are flattened into
    /// [`Error::InvalidPayload`] or a transport error carrying their message.
    #[must_use]
    pub fn share(&self) -> Self {
        match self {
            Self::Invalid(error) => Self::Invalid(error.clone()),
            Self::Adapter(error) => Self::Adapter(error.clone()),
            Self::NotFound { resource_type, id } => Self::NotFound {
                resource_type: resource_type.clone(),
                id: id.clone(),
            },
            Self::Abandoned { resource_type, id } => Self::Abandoned {
                resource_type: resource_type.clone(),
                id: id.clone(),
            },
            Self::Connection(message) => Self::Connection(message.clone()),
            Self::Tls(message) => Self::Tls(message.clone()),
            Self::Timeout => Self::Timeout,
            Self::InvalidRequest(message) => Self::InvalidRequest(message.clone()),
            other => Self::InvalidPayload(other.to_string()),
        }
    }
}
