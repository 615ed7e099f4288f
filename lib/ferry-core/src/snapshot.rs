//! Read-only views of records handed to the adapter by the store.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::{FieldSelection, QueryParams, RecordIdentifier, ResourceType};

/// Options a caller attaches to a single request.
///
/// Values here override whatever the adapter would send by default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdapterOptions {
    /// Field selection replacing the snapshot's requested fields.
    pub fields: Option<FieldSelection>,
    /// Extra query parameters; they override any default parameter.
    pub query: QueryParams,
}

/// Current value of a relationship in a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationshipSnapshot {
    /// To-one relationship, `None` when empty.
    BelongsTo(Option<RecordIdentifier>),
    /// To-many relationship.
    HasMany(Vec<RecordIdentifier>),
}

/// Point-in-time view of a record's attributes and relationships.
///
/// Attribute and relationship names are the application-level names; the
/// serializer maps them to wire keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Identity of the record.
    pub identifier: RecordIdentifier,
    /// Attribute values by attribute name.
    pub attributes: BTreeMap<String, Value>,
    /// Relationship values by relationship name.
    pub relationships: BTreeMap<String, RelationshipSnapshot>,
    /// Comma-delimited relationship paths to side-load.
    pub include: Option<String>,
    /// Fields the caller wants loaded.
    pub fields: Option<FieldSelection>,
    /// Per-request overrides.
    pub adapter_options: AdapterOptions,
}

impl Snapshot {
    /// Snapshot with no attributes or relationships.
    #[must_use]
    pub fn new(identifier: RecordIdentifier) -> Self {
        Self {
            identifier,
            attributes: BTreeMap::new(),
            relationships: BTreeMap::new(),
            include: None,
            fields: None,
            adapter_options: AdapterOptions::default(),
        }
    }

    /// Resource type of the record.
    #[must_use]
    pub fn resource_type(&self) -> &ResourceType {
        &self.identifier.resource_type
    }

    /// Id of the record, if saved.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.identifier.id()
    }

    /// Set an attribute value.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set a to-one relationship.
    #[must_use]
    pub fn with_belongs_to(
        mut self,
        name: impl Into<String>,
        related: Option<RecordIdentifier>,
    ) -> Self {
        self.relationships
            .insert(name.into(), RelationshipSnapshot::BelongsTo(related));
        self
    }

    /// Set a to-many relationship.
    #[must_use]
    pub fn with_has_many(mut self, name: impl Into<String>, related: Vec<RecordIdentifier>) -> Self {
        self.relationships
            .insert(name.into(), RelationshipSnapshot::HasMany(related));
        self
    }

    /// Set the relationship paths to side-load.
    #[must_use]
    pub fn with_include(mut self, include: impl Into<String>) -> Self {
        self.include = Some(include.into());
        self
    }

    /// Set the requested fields.
    #[must_use]
    pub fn with_fields(mut self, fields: FieldSelection) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Set per-request adapter options.
    #[must_use]
    pub fn with_adapter_options(mut self, options: AdapterOptions) -> Self {
        self.adapter_options = options;
        self
    }

    /// Fields for this request: the adapter option override when present,
    /// the snapshot's own selection otherwise.
    #[must_use]
    pub fn requested_fields(&self) -> Option<&FieldSelection> {
        self.adapter_options.fields.as_ref().or(self.fields.as_ref())
    }
}

/// View of the records of one type the store currently holds, passed to
/// collection-level operations.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecordArray {
    /// Type of the records.
    pub resource_type: ResourceType,
    /// Number of records already loaded.
    pub len: usize,
    /// Comma-delimited relationship paths to side-load.
    pub include: Option<String>,
    /// Per-request overrides.
    pub adapter_options: AdapterOptions,
}

impl SnapshotRecordArray {
    /// Record array with no loaded record.
    #[must_use]
    pub fn new(resource_type: impl Into<ResourceType>) -> Self {
        Self {
            resource_type: resource_type.into(),
            len: 0,
            include: None,
            adapter_options: AdapterOptions::default(),
        }
    }

    /// Set the number of loaded records.
    #[must_use]
    pub fn with_len(mut self, len: usize) -> Self {
        self.len = len;
        self
    }

    /// Set the relationship paths to side-load.
    #[must_use]
    pub fn with_include(mut self, include: impl Into<String>) -> Self {
        self.include = Some(include.into());
        self
    }

    /// Returns `true` when no record of the type is loaded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}
