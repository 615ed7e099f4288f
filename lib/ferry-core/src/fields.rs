//! Sparse field selections.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Requested fields, grouped by resource type (or relationship group).
///
/// Comparisons are set based: `"author,body"` and `"body,author"` select the
/// same fields.
///
/// # Example
///
/// ```
/// use ferry_core::FieldSelection;
///
/// let requested = FieldSelection::new().with("comments", "author");
/// let cached = FieldSelection::new().with("comments", "body,author");
/// assert!(cached.covers(&requested));
/// assert!(!requested.covers(&cached));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelection {
    groups: BTreeMap<String, BTreeSet<String>>,
}

impl FieldSelection {
    /// An empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group from a comma-delimited list of field names.
    #[must_use]
    pub fn with(mut self, group: impl Into<String>, fields: &str) -> Self {
        self.insert(group, fields);
        self
    }

    /// Add (or extend) a group from a comma-delimited list of field names.
    pub fn insert(&mut self, group: impl Into<String>, fields: &str) {
        let set = self.groups.entry(group.into()).or_default();
        set.extend(
            fields
                .split(',')
                .map(str::trim)
                .filter(|field| !field.is_empty())
                .map(ToString::to_string),
        );
    }

    /// Add every field of `other`, group by group.
    pub fn merge(&mut self, other: &Self) {
        for (group, fields) in &other.groups {
            self.groups
                .entry(group.clone())
                .or_default()
                .extend(fields.iter().cloned());
        }
    }

    /// Returns `true` when no group is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Fields selected for a group.
    #[must_use]
    pub fn get(&self, group: &str) -> Option<&BTreeSet<String>> {
        self.groups.get(group)
    }

    /// Iterate over `(group, comma-delimited fields)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, String)> {
        self.groups.iter().map(|(group, fields)| {
            let joined = fields.iter().map(String::as_str).collect::<Vec<_>>().join(",");
            (group.as_str(), joined)
        })
    }

    /// Returns `true` if this selection already contains every field of
    /// `requested`: each group of the request must exist here and the
    /// requested fields must be a subset of the fields selected here.
    #[must_use]
    pub fn covers(&self, requested: &Self) -> bool {
        requested.groups.iter().all(|(group, fields)| {
            self.groups
                .get(group)
                .is_some_and(|cached| fields.is_subset(cached))
        })
    }
}

impl fmt::Display for FieldSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .iter()
            .map(|(group, fields)| format!("{group}={fields}"))
            .collect::<Vec<_>>()
            .join("&");
        f.write_str(&rendered)
    }
}

impl Serialize for FieldSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for FieldSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        let mut selection = Self::new();
        for (group, fields) in raw {
            selection.insert(group, &fields);
        }
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_set_based() {
        let a = FieldSelection::new().with("comments", "author,body");
        let b = FieldSelection::new().with("comments", "body, author");
        assert_eq!(a, b);
    }

    #[test]
    fn covers_requires_every_group() {
        let cached = FieldSelection::new().with("comments", "author,body");
        let requested = FieldSelection::new()
            .with("comments", "author")
            .with("posts", "title");
        assert!(!cached.covers(&requested));
    }

    #[test]
    fn covers_rejects_larger_request() {
        let cached = FieldSelection::new().with("comments", "author");
        let requested = FieldSelection::new().with("comments", "author,body");
        assert!(!cached.covers(&requested));
        assert!(requested.covers(&cached));
    }

    #[test]
    fn merge_unions_groups() {
        let mut selection = FieldSelection::new().with("posts", "title");
        selection.merge(&FieldSelection::new().with("posts", "body").with("comments", "author"));

        assert_eq!(selection.get("posts").map(BTreeSet::len), Some(2));
        assert!(selection.covers(&FieldSelection::new().with("comments", "author")));
    }

    #[test]
    fn empty_request_is_covered() {
        let cached = FieldSelection::new().with("comments", "author");
        assert!(cached.covers(&FieldSelection::new()));
    }

    #[test]
    fn serde_uses_comma_lists() {
        let selection: FieldSelection =
            serde_json::from_value(serde_json::json!({"comments": "body,author"}))
                .expect("deserialize");
        assert_eq!(selection, FieldSelection::new().with("comments", "author,body"));

        let value = serde_json::to_value(&selection).expect("serialize");
        assert_eq!(value, serde_json::json!({"comments": "author,body"}));
    }
}
