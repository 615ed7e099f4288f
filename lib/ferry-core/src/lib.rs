//! Core types and traits for the ferry JSON:API data-access layer.
//!
//! This crate provides the transport-neutral vocabulary shared by the adapter:
//! - [`Method`], [`Request`] and [`Response`] - HTTP request descriptors and responses
//! - [`HttpClient`] - Transport trait executing a [`Request`]
//! - [`ResponseOutcome`] - Classified result of a dispatched request
//! - [`Error`], [`InvalidError`], [`AdapterError`] and [`Result`] - Error handling
//! - [`ResourceType`] and [`RecordIdentifier`] - Record identity
//! - [`FieldSelection`] and [`QueryParams`] - Sparse fields and query parameters
//! - [`Snapshot`] and [`SnapshotRecordArray`] - Read-only record views from the store
//! - [`NormalizedDocument`] - Canonical shape of a response document
//! - [`OperationKind`] - The record operations the adapter performs

mod body;
mod client;
mod document;
mod error;
mod fields;
mod identifier;
mod method;
mod operation;
mod outcome;
pub mod prelude;
mod query;
mod request;
mod response;
mod snapshot;

pub use body::{JSON_API_MEDIA_TYPE, from_json, to_json, to_query_string};
pub use client::HttpClient;
pub use document::{
    NormalizedDocument, PrimaryData, Relationship, RelationshipData, ResourceObject,
};
pub use error::{AdapterError, AdapterErrorKind, Error, InvalidError, Result};
pub use fields::FieldSelection;
pub use identifier::{RecordIdentifier, ResourceType};
pub use method::Method;
pub use operation::OperationKind;
pub use outcome::ResponseOutcome;
pub use query::QueryParams;
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use snapshot::{AdapterOptions, RelationshipSnapshot, Snapshot, SnapshotRecordArray};

// Re-export http crate types for status codes
pub use http::StatusCode;
