//! JSON:API serialization.
//!
//! Outbound, a [`Snapshot`] becomes a `{"data": {...}}` document with wire
//! keys. Inbound, a response document becomes a [`NormalizedDocument`] with
//! internal type, attribute and relationship names.
//!
//! Wire keys come from a [`KeyTransform`] unless an explicit rename is
//! configured. Both directions use the same mapping, so attribute names
//! survive a serialize/normalize round trip.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use ferry_core::{
    Error, InvalidError, NormalizedDocument, OperationKind, PrimaryData, RecordIdentifier, Relationship,
    RelationshipData, RelationshipSnapshot, ResourceObject, ResourceType, Result, Snapshot,
};
use serde_json::{Map, Value, json};

use crate::inflect::Inflector;
use crate::schema::SchemaSource;

// ============================================================================
// Key Transform
// ============================================================================

/// Mapping between internal names and wire keys.
pub trait KeyTransform: Send + Sync {
    /// Wire key of an attribute.
    fn key_for_attribute(&self, attribute: &str, resource_type: &ResourceType) -> String;

    /// Wire key of a relationship.
    fn key_for_relationship(&self, relationship: &str, resource_type: &ResourceType) -> String;

    /// Attribute name of a wire key, used when the type has no schema.
    fn attribute_for_key(&self, key: &str, resource_type: &ResourceType) -> String;

    /// Relationship name of a wire key, used when the type has no schema.
    fn relationship_for_key(&self, key: &str, resource_type: &ResourceType) -> String;

    /// Wire `type` member of a resource type.
    fn payload_key_from_type(&self, resource_type: &ResourceType) -> String;

    /// Resource type of a wire `type` member.
    fn type_from_payload_key(&self, key: &str) -> ResourceType;

    /// Form a type name takes once it has been through the wire, so that
    /// `type_from_payload_key(&payload_key_from_type(t)) == model_name(t)`.
    fn model_name(&self, resource_type: &ResourceType) -> ResourceType {
        resource_type.clone()
    }
}

/// Dasherized keys and pluralized wire types: `publishedAt` is sent as
/// `published-at`, a `post` as `posts` and a `blogPost` as `blog-posts`.
#[derive(Clone)]
pub struct DasherizedKeys {
    inflector: Arc<dyn Inflector>,
}

impl std::fmt::Debug for DasherizedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DasherizedKeys").finish_non_exhaustive()
    }
}

impl DasherizedKeys {
    /// Create the transform.
    #[must_use]
    pub fn new(inflector: Arc<dyn Inflector>) -> Self {
        Self { inflector }
    }
}

impl KeyTransform for DasherizedKeys {
    fn key_for_attribute(&self, attribute: &str, _resource_type: &ResourceType) -> String {
        self.inflector.dasherize(attribute)
    }

    fn key_for_relationship(&self, relationship: &str, _resource_type: &ResourceType) -> String {
        self.inflector.dasherize(relationship)
    }

    fn attribute_for_key(&self, key: &str, _resource_type: &ResourceType) -> String {
        self.inflector.camelize(key)
    }

    fn relationship_for_key(&self, key: &str, _resource_type: &ResourceType) -> String {
        self.inflector.camelize(key)
    }

    fn payload_key_from_type(&self, resource_type: &ResourceType) -> String {
        self.inflector.pluralize(&self.inflector.dasherize(resource_type.as_str()))
    }

    fn type_from_payload_key(&self, key: &str) -> ResourceType {
        ResourceType::new(self.inflector.singularize(&self.inflector.dasherize(key)))
    }

    fn model_name(&self, resource_type: &ResourceType) -> ResourceType {
        ResourceType::new(self.inflector.dasherize(resource_type.as_str()))
    }
}

// ============================================================================
// Serializer
// ============================================================================

/// Both directions of the wire format.
pub trait RecordSerializer: Send + Sync {
    /// Build the request document for a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be represented on the wire.
    fn serialize_into_hash(&self, resource_type: &ResourceType, snapshot: &Snapshot)
    -> Result<Value>;

    /// Normalize a response document received for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPayload`] if the payload is not a well-formed
    /// document for the operation.
    fn normalize_response(
        &self,
        resource_type: &ResourceType,
        payload: Value,
        kind: OperationKind,
    ) -> Result<NormalizedDocument>;

    /// Validation messages of a rejected `resource_type` record, keyed by
    /// attribute name.
    fn extract_errors(
        &self,
        _resource_type: &ResourceType,
        error: &InvalidError,
    ) -> BTreeMap<String, Vec<String>> {
        error.errors_by_key()
    }
}

/// Stock [`RecordSerializer`] for JSON:API documents.
#[derive(Clone)]
pub struct JsonApiSerializer {
    keys: Arc<dyn KeyTransform>,
    schema: Arc<dyn SchemaSource>,
    renames: HashMap<ResourceType, BTreeMap<String, String>>,
}

impl std::fmt::Debug for JsonApiSerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonApiSerializer")
            .field("renames", &self.renames)
            .finish_non_exhaustive()
    }
}

impl JsonApiSerializer {
    /// Create a serializer.
    #[must_use]
    pub fn new(keys: Arc<dyn KeyTransform>, schema: Arc<dyn SchemaSource>) -> Self {
        Self {
            keys,
            schema,
            renames: HashMap::new(),
        }
    }

    /// Send attribute or relationship `name` of `resource_type` under `key`.
    #[must_use]
    pub fn rename(
        mut self,
        resource_type: impl Into<ResourceType>,
        name: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        self.renames
            .entry(resource_type.into())
            .or_default()
            .insert(name.into(), key.into());
        self
    }

    fn renamed(&self, resource_type: &ResourceType, name: &str) -> Option<String> {
        self.renames
            .get(resource_type)
            .and_then(|renames| renames.get(name))
            .cloned()
    }

    fn renamed_from(&self, resource_type: &ResourceType, key: &str) -> Option<String> {
        self.renames.get(resource_type).and_then(|renames| {
            renames
                .iter()
                .find(|(_, wire)| *wire == key)
                .map(|(name, _)| name.clone())
        })
    }

    fn attribute_key(&self, resource_type: &ResourceType, attribute: &str) -> String {
        self.renamed(resource_type, attribute)
            .unwrap_or_else(|| self.keys.key_for_attribute(attribute, resource_type))
    }

    fn relationship_key(&self, resource_type: &ResourceType, relationship: &str) -> String {
        self.renamed(resource_type, relationship)
            .unwrap_or_else(|| self.keys.key_for_relationship(relationship, resource_type))
    }

    /// Attribute name of a wire key; `None` when the schema does not declare it.
    fn attribute_name(&self, resource_type: &ResourceType, key: &str) -> Option<String> {
        if let Some(name) = self.renamed_from(resource_type, key) {
            return Some(name);
        }
        match self.schema.schema(resource_type) {
            Some(schema) => schema
                .attributes
                .iter()
                .find(|attribute| self.attribute_key(resource_type, attribute) == key)
                .cloned(),
            None => Some(self.keys.attribute_for_key(key, resource_type)),
        }
    }

    /// Relationship name of a wire key; `None` when the schema does not declare it.
    fn relationship_name(&self, resource_type: &ResourceType, key: &str) -> Option<String> {
        if let Some(name) = self.renamed_from(resource_type, key) {
            return Some(name);
        }
        match self.schema.schema(resource_type) {
            Some(schema) => schema
                .relationships
                .iter()
                .find(|rel| self.relationship_key(resource_type, &rel.name) == key)
                .map(|rel| rel.name.clone()),
            None => Some(self.keys.relationship_for_key(key, resource_type)),
        }
    }

    fn linkage_to_wire(&self, identifier: &RecordIdentifier) -> Option<Value> {
        identifier.id().map(|id| {
            json!({
                "type": self.keys.payload_key_from_type(&identifier.resource_type),
                "id": id,
            })
        })
    }

    /// Serialize a snapshot into a resource object (without the `data` wrapper).
    #[must_use]
    pub fn serialize(&self, resource_type: &ResourceType, snapshot: &Snapshot) -> Value {
        let mut resource = Map::new();
        resource.insert(
            "type".to_string(),
            Value::String(self.keys.payload_key_from_type(resource_type)),
        );
        if let Some(id) = snapshot.id() {
            resource.insert("id".to_string(), Value::String(id.to_string()));
        }

        if !snapshot.attributes.is_empty() {
            let attributes = snapshot
                .attributes
                .iter()
                .map(|(name, value)| (self.attribute_key(resource_type, name), value.clone()))
                .collect::<Map<_, _>>();
            resource.insert("attributes".to_string(), Value::Object(attributes));
        }

        if !snapshot.relationships.is_empty() {
            let relationships = snapshot
                .relationships
                .iter()
                .map(|(name, relationship)| {
                    let data = match relationship {
                        RelationshipSnapshot::BelongsTo(related) => related
                            .as_ref()
                            .and_then(|related| self.linkage_to_wire(related))
                            .unwrap_or(Value::Null),
                        RelationshipSnapshot::HasMany(related) => Value::Array(
                            related
                                .iter()
                                .filter_map(|related| self.linkage_to_wire(related))
                                .collect(),
                        ),
                    };
                    (self.relationship_key(resource_type, name), json!({ "data": data }))
                })
                .collect::<Map<_, _>>();
            resource.insert("relationships".to_string(), Value::Object(relationships));
        }

        Value::Object(resource)
    }

    /// Resource type of a wire `type` member, spelled like `expected` when
    /// both name the same type.
    fn resolve_type(&self, wire_type: &str, expected: Option<&ResourceType>) -> ResourceType {
        let resource_type = self.keys.type_from_payload_key(wire_type);
        match expected {
            Some(expected) if self.keys.model_name(expected) == resource_type => expected.clone(),
            _ => resource_type,
        }
    }

    fn linkage_from_wire(
        &self,
        value: &Value,
        declared: Option<&ResourceType>,
    ) -> Result<RecordIdentifier> {
        let wire_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::invalid_payload("resource linkage without a type"))?;
        let id = id_of(value)
            .ok_or_else(|| Error::invalid_payload("resource linkage without an id"))?;
        Ok(RecordIdentifier::new(self.resolve_type(wire_type, declared), id))
    }

    fn normalize_relationship(
        &self,
        resource_type: &ResourceType,
        name: &str,
        value: &Value,
    ) -> Result<Relationship> {
        let declared = self
            .schema
            .schema(resource_type)
            .and_then(|schema| schema.relationship_named(name))
            .map(|rel| &rel.related);

        let data = match value.get("data") {
            None => None,
            Some(Value::Null) => Some(RelationshipData::One(None)),
            Some(Value::Array(items)) => Some(RelationshipData::Many(
                items
                    .iter()
                    .map(|item| self.linkage_from_wire(item, declared))
                    .collect::<Result<_>>()?,
            )),
            Some(item @ Value::Object(_)) => {
                Some(RelationshipData::One(Some(self.linkage_from_wire(item, declared)?)))
            }
            Some(_) => {
                return Err(Error::invalid_payload(format!(
                    "relationship '{name}' has malformed data"
                )));
            }
        };

        let polymorphic = match (&data, declared) {
            (Some(RelationshipData::One(Some(related))), Some(declared)) => {
                related.resource_type != *declared
            }
            (Some(RelationshipData::Many(related)), Some(declared)) => related
                .iter()
                .any(|related| related.resource_type != *declared),
            _ => false,
        };

        Ok(Relationship {
            data,
            links: value.get("links").cloned(),
            meta: value.get("meta").cloned(),
            polymorphic,
        })
    }

    /// Normalize one resource object; `requested` is only compared against
    /// primary data.
    fn normalize_resource(
        &self,
        value: &Value,
        requested: &ResourceType,
        primary: bool,
    ) -> Result<ResourceObject> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::invalid_payload("resource object must be a JSON object"))?;
        let wire_type = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::invalid_payload("resource object without a type"))?;
        let id = id_of(value)
            .ok_or_else(|| Error::invalid_payload("resource object without an id"))?;

        let resource_type = self.resolve_type(wire_type, Some(requested));
        let mut resource = ResourceObject::new(resource_type.clone(), id);
        resource.polymorphic = primary && *requested != resource_type;

        if let Some(Value::Object(attributes)) = object.get("attributes") {
            for (key, value) in attributes {
                if let Some(name) = self.attribute_name(&resource_type, key) {
                    resource.attributes.insert(name, value.clone());
                }
            }
        }

        if let Some(Value::Object(relationships)) = object.get("relationships") {
            for (key, value) in relationships {
                if let Some(name) = self.relationship_name(&resource_type, key) {
                    let relationship = self.normalize_relationship(&resource_type, &name, value)?;
                    resource.relationships.insert(name, relationship);
                }
            }
        }

        resource.links = object.get("links").cloned();
        resource.meta = object.get("meta").cloned();
        Ok(resource)
    }
}

/// `id` member as a string; numeric ids are accepted.
fn id_of(value: &Value) -> Option<String> {
    match value.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

impl RecordSerializer for JsonApiSerializer {
    fn serialize_into_hash(
        &self,
        resource_type: &ResourceType,
        snapshot: &Snapshot,
    ) -> Result<Value> {
        Ok(json!({ "data": self.serialize(resource_type, snapshot) }))
    }

    fn normalize_response(
        &self,
        resource_type: &ResourceType,
        payload: Value,
        kind: OperationKind,
    ) -> Result<NormalizedDocument> {
        let single = kind.expects_single();
        let mut document = match payload {
            Value::Null => Map::new(),
            Value::Object(document) => document,
            _ => {
                return Err(Error::invalid_payload(
                    "response document must be a JSON object",
                ));
            }
        };

        let data = match (single, document.remove("data")) {
            (true, None | Some(Value::Null)) => PrimaryData::Single(None),
            (true, Some(resource @ Value::Object(_))) => PrimaryData::Single(Some(
                self.normalize_resource(&resource, resource_type, true)?,
            )),
            (false, None) => PrimaryData::Many(Vec::new()),
            (false, Some(Value::Array(resources))) => PrimaryData::Many(
                resources
                    .iter()
                    .map(|resource| self.normalize_resource(resource, resource_type, true))
                    .collect::<Result<_>>()?,
            ),
            (true, Some(_)) => {
                return Err(Error::invalid_payload(format!(
                    "{kind} expects a single resource as primary data"
                )));
            }
            (false, Some(_)) => {
                return Err(Error::invalid_payload(format!(
                    "{kind} expects an array of resources as primary data"
                )));
            }
        };

        let included = match document.remove("included") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(resources)) => resources
                .iter()
                .map(|resource| self.normalize_resource(resource, resource_type, false))
                .collect::<Result<_>>()?,
            Some(_) => return Err(Error::invalid_payload("included must be an array")),
        };

        Ok(NormalizedDocument {
            data,
            included,
            meta: document.remove("meta"),
        })
    }

    fn extract_errors(
        &self,
        resource_type: &ResourceType,
        error: &InvalidError,
    ) -> BTreeMap<String, Vec<String>> {
        error.errors_by_attribute_with(|key| {
            self.attribute_name(resource_type, key)
                .or_else(|| self.relationship_name(resource_type, key))
                .unwrap_or_else(|| self.keys.attribute_for_key(key, resource_type))
        })
    }
}
