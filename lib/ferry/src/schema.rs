//! Resource schemas: which attributes and relationships a type declares.

use std::collections::HashMap;

use ferry_core::ResourceType;

/// Cardinality of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipKind {
    /// To-one.
    BelongsTo,
    /// To-many.
    HasMany,
}

/// A declared relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipDef {
    /// Relationship name on the record.
    pub name: String,
    /// Cardinality.
    pub kind: RelationshipKind,
    /// Type of the related records.
    pub related: ResourceType,
    /// Whether related records may be of a subtype of `related`.
    pub polymorphic: bool,
}

/// Attributes and relationships declared for one resource type.
///
/// # Example
///
/// ```
/// use ferry::schema::ResourceSchema;
///
/// let post = ResourceSchema::new()
///     .attribute("title")
///     .attribute("publishedAt")
///     .belongs_to("author", "user")
///     .has_many("comments", "comment");
/// assert_eq!(post.attributes.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSchema {
    /// Attribute names.
    pub attributes: Vec<String>,
    /// Relationship declarations.
    pub relationships: Vec<RelationshipDef>,
}

impl ResourceSchema {
    /// Empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(name.into());
        self
    }

    /// Declare a to-one relationship.
    #[must_use]
    pub fn belongs_to(self, name: impl Into<String>, related: impl Into<ResourceType>) -> Self {
        self.relationship(name, RelationshipKind::BelongsTo, related, false)
    }

    /// Declare a to-many relationship.
    #[must_use]
    pub fn has_many(self, name: impl Into<String>, related: impl Into<ResourceType>) -> Self {
        self.relationship(name, RelationshipKind::HasMany, related, false)
    }

    /// Declare a relationship with every option spelled out.
    #[must_use]
    pub fn relationship(
        mut self,
        name: impl Into<String>,
        kind: RelationshipKind,
        related: impl Into<ResourceType>,
        polymorphic: bool,
    ) -> Self {
        self.relationships.push(RelationshipDef {
            name: name.into(),
            kind,
            related: related.into(),
            polymorphic,
        });
        self
    }

    /// Look up a relationship by name.
    #[must_use]
    pub fn relationship_named(&self, name: &str) -> Option<&RelationshipDef> {
        self.relationships.iter().find(|rel| rel.name == name)
    }
}

/// Source of resource schemas.
pub trait SchemaSource: Send + Sync {
    /// Schema of a resource type, `None` if the type is unknown.
    fn schema(&self, resource_type: &ResourceType) -> Option<&ResourceSchema>;
}

/// In-memory [`SchemaSource`].
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: HashMap<ResourceType, ResourceSchema>,
}

impl SchemaRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the schema of a type.
    #[must_use]
    pub fn register(mut self, resource_type: impl Into<ResourceType>, schema: ResourceSchema) -> Self {
        self.types.insert(resource_type.into(), schema);
        self
    }
}

impl SchemaSource for SchemaRegistry {
    fn schema(&self, resource_type: &ResourceType) -> Option<&ResourceSchema> {
        self.types.get(resource_type)
    }
}
