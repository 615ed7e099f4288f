//! Record operations understood by the adapter.

use derive_more::Display;

use crate::Method;

/// The record operation a request is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum OperationKind {
    /// Fetch one record by id.
    #[display("findRecord")]
    FindRecord,
    /// Fetch every record of a type.
    #[display("findAll")]
    FindAll,
    /// Fetch several records by id in one request.
    #[display("findMany")]
    FindMany,
    /// Fetch the records of a has-many relationship.
    #[display("findHasMany")]
    FindHasMany,
    /// Fetch the record of a belongs-to relationship.
    #[display("findBelongsTo")]
    FindBelongsTo,
    /// Create a new record.
    #[display("createRecord")]
    CreateRecord,
    /// Update an existing record.
    #[display("updateRecord")]
    UpdateRecord,
    /// Delete a record.
    #[display("deleteRecord")]
    DeleteRecord,
    /// Query a collection.
    #[display("query")]
    Query,
    /// Query for a single record.
    #[display("queryRecord")]
    QueryRecord,
}

impl OperationKind {
    /// HTTP method used for the operation.
    #[must_use]
    pub const fn method(&self) -> Method {
        match self {
            Self::CreateRecord => Method::Post,
            Self::UpdateRecord => Method::Patch,
            Self::DeleteRecord => Method::Delete,
            _ => Method::Get,
        }
    }

    /// Returns `true` for operations addressing a collection URL, which never
    /// carries an id segment.
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(
            self,
            Self::FindAll | Self::FindMany | Self::CreateRecord | Self::Query | Self::QueryRecord
        )
    }

    /// Returns `true` if the response document holds a single primary resource.
    #[must_use]
    pub const fn expects_single(&self) -> bool {
        matches!(
            self,
            Self::FindRecord
                | Self::FindBelongsTo
                | Self::CreateRecord
                | Self::UpdateRecord
                | Self::DeleteRecord
                | Self::QueryRecord
        )
    }
}
