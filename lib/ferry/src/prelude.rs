//! Prelude module for convenient imports.
//!
//! ```ignore
//! use ferry::prelude::*;
//! ```

pub use crate::{
    Adapter, AdapterConfig, AdapterOptions, Error, FetchHandle, FieldSelection, HttpClient,
    HyperClient, NormalizedDocument, OperationKind, PrimaryData, QueryParams, RecordAdapter,
    RecordIdentifier, ResourceObject, ResourceType, Result, Snapshot, SnapshotRecordArray,
};
