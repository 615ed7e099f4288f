//! Canonical in-memory shape of a response document.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::{RecordIdentifier, ResourceType};

/// Resource linkage of a normalized relationship.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RelationshipData {
    /// To-one linkage, `None` for an empty relationship.
    One(Option<RecordIdentifier>),
    /// To-many linkage.
    Many(Vec<RecordIdentifier>),
}

/// A normalized relationship.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Relationship {
    /// Resource linkage, when the payload carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RelationshipData>,
    /// Relationship links (`related`, `self`), kept verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
    /// Relationship meta, kept verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    /// Set when the linkage points at records of a type other than the
    /// declared related type.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub polymorphic: bool,
}

/// A normalized resource: internal type name, attribute and relationship names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceObject {
    /// Internal resource type.
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Server id.
    pub id: String,
    /// Attributes keyed by internal attribute name.
    pub attributes: BTreeMap<String, Value>,
    /// Relationships keyed by internal relationship name.
    pub relationships: BTreeMap<String, Relationship>,
    /// Set when the resource's type differs from the type that was requested.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub polymorphic: bool,
    /// Resource links, kept verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
    /// Resource meta, kept verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl ResourceObject {
    /// Resource with no attributes or relationships.
    #[must_use]
    pub fn new(resource_type: impl Into<ResourceType>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            attributes: BTreeMap::new(),
            relationships: BTreeMap::new(),
            polymorphic: false,
            links: None,
            meta: None,
        }
    }

    /// Identifier of the resource.
    #[must_use]
    pub fn identifier(&self) -> RecordIdentifier {
        RecordIdentifier::new(self.resource_type.clone(), self.id.clone())
    }

    /// Returns `true` if the resource has the given type and id.
    #[must_use]
    pub fn matches(&self, resource_type: &ResourceType, id: &str) -> bool {
        self.resource_type == *resource_type && self.id == id
    }
}

/// Primary data of a normalized document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PrimaryData {
    /// Single resource, `None` for `"data": null`.
    Single(Option<ResourceObject>),
    /// Resource collection.
    Many(Vec<ResourceObject>),
}

/// Canonical document handed to the store: primary data, side-loaded
/// resources and top-level meta.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedDocument {
    /// Primary data.
    pub data: PrimaryData,
    /// Side-loaded resources.
    pub included: Vec<ResourceObject>,
    /// Top-level meta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl NormalizedDocument {
    /// Document with only primary data.
    #[must_use]
    pub fn new(data: PrimaryData) -> Self {
        Self {
            data,
            included: Vec::new(),
            meta: None,
        }
    }

    /// Primary resources, whatever the shape of the primary data.
    #[must_use]
    pub fn primary(&self) -> Vec<&ResourceObject> {
        match &self.data {
            PrimaryData::Single(resource) => resource.iter().collect(),
            PrimaryData::Many(resources) => resources.iter().collect(),
        }
    }

    /// Locate a resource among the primary data, then the included resources.
    #[must_use]
    pub fn find(&self, resource_type: &ResourceType, id: &str) -> Option<&ResourceObject> {
        self.primary()
            .into_iter()
            .chain(self.included.iter())
            .find(|resource| resource.matches(resource_type, id))
    }
}
