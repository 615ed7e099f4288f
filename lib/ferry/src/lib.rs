//! JSON:API request adapter and response normalizer.
//!
//! `ferry` maps record operations (find, create, update, delete, query) onto
//! JSON:API requests and turns the responses into [`NormalizedDocument`]s.
//! On the way it:
//!
//! - builds URLs from `host`, `namespace` and the pluralized type ([`url_builder`]);
//! - layers `include`, `fields[...]`, `since` and `filter[id]` query parameters ([`query`]);
//! - skips reloads whose sparse fields were already fetched ([`tracking`]);
//! - batches the `findRecord` calls of one tick into `findMany` requests ([`coalesce`]);
//! - classifies every response as success, invalid (422) or adapter error ([`dispatch`]);
//! - serializes snapshots and normalizes documents ([`serializer`]).
//!
//! # Example
//!
//! ```no_run
//! use ferry::prelude::*;
//! use ferry::{Adapter, AdapterConfig, HyperClient};
//!
//! # async fn example() -> ferry::Result<()> {
//! let adapter = Adapter::builder(HyperClient::builder().with_logging().build())
//!     .config(
//!         AdapterConfig::builder()
//!             .host("https://api.example.com")
//!             .coalesce_find_requests(true)
//!             .build(),
//!     )
//!     .build()?;
//!
//! let first = adapter.schedule_fetch(Snapshot::new(RecordIdentifier::new("post", "1")));
//! let second = adapter.schedule_fetch(Snapshot::new(RecordIdentifier::new("post", "2")));
//! adapter.flush().await; // GET /posts?filter[id]=1,2
//!
//! let (first, second) = (first.await?, second.await?);
//! # drop((first, second));
//! # Ok(())
//! # }
//! ```

mod adapter;
mod client;
pub mod coalesce;
mod config;
mod connector;
pub mod dispatch;
pub mod inflect;
pub mod middleware;
pub mod prelude;
pub mod query;
pub mod schema;
pub mod serializer;
pub mod tracking;
pub mod url_builder;

pub use adapter::{Adapter, AdapterBuilder, RecordAdapter};
pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use coalesce::FetchHandle;
pub use config::{
    AdapterConfig, AdapterConfigBuilder, ClientConfig, ClientConfigBuilder,
    DEFAULT_MAX_URL_LENGTH, DEFAULT_ORIGIN,
};
pub use connector::https_connector;
pub use inflect::{DefaultInflector, Inflector};
pub use schema::{RelationshipDef, RelationshipKind, ResourceSchema, SchemaRegistry, SchemaSource};
pub use serializer::{DasherizedKeys, JsonApiSerializer, KeyTransform, RecordSerializer};
pub use url_builder::{BuildUrl, UrlBuilder, UrlIds};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use ferry_core::{
    AdapterError, AdapterErrorKind, AdapterOptions, Error, FieldSelection, HttpClient,
    InvalidError, JSON_API_MEDIA_TYPE, Method, NormalizedDocument, OperationKind, PrimaryData,
    QueryParams, RecordIdentifier, Relationship, RelationshipData, RelationshipSnapshot, Request,
    RequestBuilder, ResourceObject, ResourceType, Response, ResponseOutcome, Result, Snapshot,
    SnapshotRecordArray, StatusCode, from_json, to_json, to_query_string,
};
