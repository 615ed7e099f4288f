//! Query parameter building.
//!
//! Parameters are layered: operation defaults first (`include`,
//! `fields[...]`, `since`), then the caller's explicit adapter options, which
//! win over any default. A batch sends what each of its records would have
//! sent alone, merged, plus `filter[id]`.

use ferry_core::{FieldSelection, QueryParams, Snapshot, SnapshotRecordArray};

/// What a request's query is built from.
#[derive(Debug, Clone, Copy)]
pub enum QueryContext<'a> {
    /// A single-record operation.
    Record(&'a Snapshot),
    /// `findAll`, optionally with the since token of the previous load.
    RecordArray {
        /// Records of the type already in the store.
        array: &'a SnapshotRecordArray,
        /// Since token.
        since: Option<&'a str>,
    },
    /// Lookup of several ids.
    Batch {
        /// Ids, in request order.
        ids: &'a [String],
        /// Snapshots of the batched records.
        snapshots: &'a [Snapshot],
    },
    /// `query`/`queryRecord`: the caller's query is sent as is.
    Query(&'a QueryParams),
}

/// Build the query parameters of a request.
#[must_use]
pub fn build_query(context: QueryContext<'_>) -> QueryParams {
    let mut params = QueryParams::new();
    match context {
        QueryContext::Record(snapshot) => {
            if let Some(include) = snapshot.include.as_deref().filter(|i| !i.is_empty()) {
                params.insert("include", include);
            }
            if let Some(fields) = snapshot.requested_fields() {
                params.insert_fields(fields);
            }
            params.merge(&snapshot.adapter_options.query);
        }
        QueryContext::Batch { ids, snapshots } => {
            let mut include = Vec::new();
            let mut fields = FieldSelection::new();
            for snapshot in snapshots {
                let paths = snapshot.include.iter().flat_map(|list| list.split(','));
                for path in paths.map(str::trim).filter(|path| !path.is_empty()) {
                    if !include.contains(&path) {
                        include.push(path);
                    }
                }
                if let Some(requested) = snapshot.requested_fields() {
                    fields.merge(requested);
                }
            }
            if !include.is_empty() {
                params.insert("include", include.join(","));
            }
            params.insert_fields(&fields);
            for snapshot in snapshots {
                params.merge(&snapshot.adapter_options.query);
            }
            params.insert("filter[id]", ids.join(","));
        }
        QueryContext::RecordArray { array, since } => {
            if let Some(include) = array.include.as_deref().filter(|i| !i.is_empty()) {
                params.insert("include", include);
            }
            if let Some(since) = since {
                params.insert("since", since);
            }
            if let Some(fields) = &array.adapter_options.fields {
                params.insert_fields(fields);
            }
            params.merge(&array.adapter_options.query);
        }
        QueryContext::Query(query) => {
            params.merge(query);
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use ferry_core::{AdapterOptions, FieldSelection, RecordIdentifier};

    use super::*;

    #[test]
    fn empty_snapshot_builds_empty_query() {
        let snapshot = Snapshot::new(RecordIdentifier::new("post", "1"));
        assert!(build_query(QueryContext::Record(&snapshot)).is_empty());
    }

    #[test]
    fn record_defaults() {
        let snapshot = Snapshot::new(RecordIdentifier::new("post", "1"))
            .with_include("author,comments")
            .with_fields(FieldSelection::new().with("comments", "author"));

        let params = build_query(QueryContext::Record(&snapshot));
        assert_eq!(params.get("include"), Some("author,comments"));
        assert_eq!(params.get("fields[comments]"), Some("author"));
    }

    #[test]
    fn adapter_option_fields_override_defaults() {
        let snapshot = Snapshot::new(RecordIdentifier::new("post", "1"))
            .with_fields(FieldSelection::new().with("comments", "author"))
            .with_adapter_options(AdapterOptions {
                fields: Some(FieldSelection::new().with("comments", "body")),
                query: QueryParams::new().with("include", "tags"),
            });

        let params = build_query(QueryContext::Record(&snapshot));
        assert_eq!(params.get("fields[comments]"), Some("body"));
        assert_eq!(params.get("include"), Some("tags"));
    }

    #[test]
    fn record_array_with_since() {
        let array = SnapshotRecordArray::new("post").with_include("author");
        let params = build_query(QueryContext::RecordArray {
            array: &array,
            since: Some("token-1"),
        });
        assert_eq!(params.get("include"), Some("author"));
        assert_eq!(params.get("since"), Some("token-1"));
    }

    #[test]
    fn batch_filters_ids_in_order() {
        let ids = vec!["3".to_string(), "1".to_string(), "2".to_string()];
        let params = build_query(QueryContext::Batch {
            ids: &ids,
            snapshots: &[],
        });
        assert_eq!(params.get("filter[id]"), Some("3,1,2"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn batch_keeps_every_record_query() {
        let ids = vec!["1".to_string(), "2".to_string()];
        let snapshots = [
            Snapshot::new(RecordIdentifier::new("post", "1"))
                .with_include("author")
                .with_fields(FieldSelection::new().with("posts", "title")),
            Snapshot::new(RecordIdentifier::new("post", "2"))
                .with_include("comments, author")
                .with_fields(FieldSelection::new().with("posts", "body")),
        ];

        let params = build_query(QueryContext::Batch {
            ids: &ids,
            snapshots: &snapshots,
        });
        assert_eq!(params.get("include"), Some("author,comments"));
        assert_eq!(params.get("fields[posts]"), Some("body,title"));
        assert_eq!(params.get("filter[id]"), Some("1,2"));
    }

    #[test]
    fn batch_of_one_matches_the_record_query() {
        let snapshot = Snapshot::new(RecordIdentifier::new("post", "1"))
            .with_include("author")
            .with_fields(FieldSelection::new().with("posts", "title"));
        let mut expected = build_query(QueryContext::Record(&snapshot));
        expected.insert("filter[id]", "1");

        let ids = vec!["1".to_string()];
        let params = build_query(QueryContext::Batch {
            ids: &ids,
            snapshots: std::slice::from_ref(&snapshot),
        });
        assert_eq!(params, expected);
    }

    #[test]
    fn query_is_passed_through() {
        let query = QueryParams::new().with("filter[title]", "rust").with("page[size]", "5");
        assert_eq!(build_query(QueryContext::Query(&query)), query);
    }
}
