//! Query parameters attached to a request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{FieldSelection, Result};

/// Query parameters keyed by their final URL name (`include`, `filter[id]`,
/// `fields[comments]`, ...).
///
/// Keys are kept sorted so the same parameters always serialize to the same
/// query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    /// An empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style [`QueryParams::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set one `fields[<group>]` parameter per group of the selection.
    pub fn insert_fields(&mut self, fields: &FieldSelection) {
        for (group, list) in fields.iter() {
            self.insert(format!("fields[{group}]"), list);
        }
    }

    /// Overlay `other` on top of these parameters; its values win.
    pub fn merge(&mut self, other: &Self) {
        self.0
            .extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Value of a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns `true` when there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encode as an `application/x-www-form-urlencoded` query string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_query_string(&self) -> Result<String> {
        crate::to_query_string(&self.0)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
