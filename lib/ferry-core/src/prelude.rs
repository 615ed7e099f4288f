//! Prelude module for convenient imports.
//!
//! ```ignore
//! use ferry_core::prelude::*;
//! ```

pub use crate::{
    AdapterError, AdapterOptions, Error, FieldSelection, HttpClient, InvalidError, Method,
    NormalizedDocument, OperationKind, QueryParams, RecordIdentifier, Request, ResourceObject,
    ResourceType, Response, ResponseOutcome, Result, Snapshot, SnapshotRecordArray,
};
