//! Field-selection tracking.
//!
//! Remembers, per record, which field selections were already requested so a
//! request already satisfied by an earlier one can skip the network.
//!
//! History lives as long as the record: the store calls
//! [`FieldTracker::forget`] when it unloads a record. Entries are otherwise
//! only ever appended.

use std::collections::HashMap;

use ferry_core::{FieldSelection, RecordIdentifier};
use tracing::debug;

/// Per-record history of requested field selections.
#[derive(Debug, Clone, Default)]
pub struct FieldTracker {
    enabled: bool,
    histories: HashMap<RecordIdentifier, Vec<FieldSelection>>,
}

impl FieldTracker {
    /// Create a tracker. A disabled tracker never asks for a refetch and
    /// keeps no history.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            histories: HashMap::new(),
        }
    }

    /// Decide whether `record` must be fetched again for `requested`.
    ///
    /// - disabled: always `false`;
    /// - no history yet: records `requested` and returns `true`;
    /// - an earlier entry covers the request: `false`;
    /// - otherwise: appends `requested` and returns `true`.
    ///
    /// Coverage is one-directional: the requested fields must be a subset of
    /// a single earlier entry, group by group. Several entries are never
    /// combined.
    pub fn should_refetch(&mut self, record: &RecordIdentifier, requested: &FieldSelection) -> bool {
        if !self.enabled {
            return false;
        }

        let history = self.histories.entry(record.clone()).or_default();
        if history.is_empty() {
            debug!(%record, fields = %requested, "no field history, fetching");
            history.push(requested.clone());
            return true;
        }

        if history.iter().any(|cached| cached.covers(requested)) {
            debug!(%record, fields = %requested, "fields already loaded");
            return false;
        }

        debug!(%record, fields = %requested, "new fields requested, fetching");
        history.push(requested.clone());
        true
    }

    /// Selections requested so far for `record`, oldest first.
    #[must_use]
    pub fn history(&self, record: &RecordIdentifier) -> &[FieldSelection] {
        self.histories.get(record).map(Vec::as_slice).unwrap_or_default()
    }

    /// Drop the history of an unloaded record.
    pub fn forget(&mut self, record: &RecordIdentifier) -> Option<Vec<FieldSelection>> {
        self.histories.remove(record)
    }
}
