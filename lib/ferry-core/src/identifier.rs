//! Record identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a record kind, e.g. `post` or `blog-comment`.
///
/// Resource types are registered by the schema collaborator; ferry treats
/// them as opaque names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceType(String);

impl ResourceType {
    /// Create a resource type from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The resource type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ResourceType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Identity of a live record: its resource type and, once saved, its id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordIdentifier {
    /// Kind of the record.
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Server id, absent for records that were never saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl RecordIdentifier {
    /// Identifier of a saved record.
    #[must_use]
    pub fn new(resource_type: impl Into<ResourceType>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: Some(id.into()),
        }
    }

    /// Identifier of a record that has no id yet.
    #[must_use]
    pub fn unsaved(resource_type: impl Into<ResourceType>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: None,
        }
    }

    /// The id, if the record was saved.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl fmt::Display for RecordIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{id}", self.resource_type),
            None => write!(f, "{}:<new>", self.resource_type),
        }
    }
}
