//! URL building.
//!
//! [`BuildUrl`] maps a resource type, id(s) and operation to a URL. Every
//! operation has its own hook with a default implementation, so a custom
//! builder only overrides what differs; [`UrlBuilder`] is the stock
//! implementation driven by `host`, `namespace` and an [`Inflector`].
//!
//! URLs are assembled as `host / namespace / path-for-type / id`. Without a
//! host the URL is root-relative.

use std::sync::Arc;

use ferry_core::{OperationKind, ResourceType};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::inflect::Inflector;

/// Characters escaped in an id path segment (everything `encodeURIComponent` escapes).
const ID_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode an id for use as a path segment.
#[must_use]
pub fn encode_id(id: &str) -> String {
    utf8_percent_encode(id, ID_SEGMENT).to_string()
}

/// Ids addressed by a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlIds<'a> {
    /// No id (collections, unsaved records).
    None,
    /// A single record.
    One(&'a str),
    /// Several records (`findMany`).
    Many(&'a [String]),
}

/// Build URLs for record operations.
pub trait BuildUrl: Send + Sync {
    /// Origin override, e.g. `https://api.example.com`.
    fn host(&self) -> Option<&str>;

    /// Path prefix, e.g. `api/v1`.
    fn namespace(&self) -> Option<&str>;

    /// Path segment of a resource type.
    fn path_for_type(&self, resource_type: &ResourceType) -> String;

    /// Prefix (`host/namespace`) of every URL, or the resolution of `path`
    /// relative to `parent`.
    ///
    /// Absolute paths are returned untouched, root-relative ones get the
    /// host prepended and other relative paths are appended to `parent`.
    fn url_prefix(&self, path: Option<&str>, parent: Option<&str>) -> String {
        let host = self
            .host()
            .filter(|host| *host != "/")
            .map(|host| host.trim_end_matches('/'))
            .unwrap_or_default();

        if let Some(path) = path {
            if is_absolute(path) {
                return path.to_string();
            }
            if path.starts_with('/') {
                return format!("{host}{path}");
            }
            let parent = parent.unwrap_or_default().trim_end_matches('/');
            return format!("{parent}/{path}");
        }

        let namespace = self
            .namespace()
            .map(|ns| ns.trim_matches('/'))
            .filter(|ns| !ns.is_empty());

        [Some(host).filter(|h| !h.is_empty()), namespace]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("/")
    }

    /// `prefix / path-for-type / id`.
    fn build_base_url(&self, resource_type: &ResourceType, id: Option<&str>) -> String {
        let prefix = self.url_prefix(None, None);
        let path = self.path_for_type(resource_type);

        let mut segments = Vec::with_capacity(3);
        if !prefix.is_empty() {
            segments.push(prefix);
        }
        if !path.is_empty() {
            segments.push(path);
        }
        if let Some(id) = id {
            segments.push(encode_id(id));
        }

        let url = segments.join("/");
        if is_absolute(&url) || url.starts_with('/') {
            url
        } else {
            format!("/{url}")
        }
    }

    /// URL of `findRecord`.
    fn url_for_find_record(&self, resource_type: &ResourceType, id: &str) -> String {
        self.build_base_url(resource_type, Some(id))
    }

    /// URL of `findAll`.
    fn url_for_find_all(&self, resource_type: &ResourceType) -> String {
        self.build_base_url(resource_type, None)
    }

    /// URL of `findMany`; the ids travel in the query, not the path.
    fn url_for_find_many(&self, resource_type: &ResourceType, _ids: &[String]) -> String {
        self.build_base_url(resource_type, None)
    }

    /// Parent URL against which relative has-many links resolve.
    fn url_for_find_has_many(&self, resource_type: &ResourceType, id: Option<&str>) -> String {
        self.build_base_url(resource_type, id)
    }

    /// Parent URL against which relative belongs-to links resolve.
    fn url_for_find_belongs_to(&self, resource_type: &ResourceType, id: Option<&str>) -> String {
        self.build_base_url(resource_type, id)
    }

    /// URL of `createRecord`.
    fn url_for_create_record(&self, resource_type: &ResourceType) -> String {
        self.build_base_url(resource_type, None)
    }

    /// URL of `updateRecord`.
    fn url_for_update_record(&self, resource_type: &ResourceType, id: Option<&str>) -> String {
        self.build_base_url(resource_type, id)
    }

    /// URL of `deleteRecord`.
    fn url_for_delete_record(&self, resource_type: &ResourceType, id: Option<&str>) -> String {
        self.build_base_url(resource_type, id)
    }

    /// URL of `query`.
    fn url_for_query(&self, resource_type: &ResourceType) -> String {
        self.build_base_url(resource_type, None)
    }

    /// URL of `queryRecord`.
    fn url_for_query_record(&self, resource_type: &ResourceType) -> String {
        self.build_base_url(resource_type, None)
    }

    /// Dispatch to the hook of `kind`.
    fn build_url(&self, resource_type: &ResourceType, ids: UrlIds<'_>, kind: OperationKind) -> String {
        let id = match ids {
            UrlIds::One(id) => Some(id),
            UrlIds::None | UrlIds::Many(_) => None,
        };
        match kind {
            OperationKind::FindRecord => match id {
                Some(id) => self.url_for_find_record(resource_type, id),
                None => self.build_base_url(resource_type, None),
            },
            OperationKind::FindAll => self.url_for_find_all(resource_type),
            OperationKind::FindMany => match ids {
                UrlIds::Many(ids) => self.url_for_find_many(resource_type, ids),
                UrlIds::One(id) => self.url_for_find_many(resource_type, &[id.to_string()]),
                UrlIds::None => self.url_for_find_many(resource_type, &[]),
            },
            OperationKind::FindHasMany => self.url_for_find_has_many(resource_type, id),
            OperationKind::FindBelongsTo => self.url_for_find_belongs_to(resource_type, id),
            OperationKind::CreateRecord => self.url_for_create_record(resource_type),
            OperationKind::UpdateRecord => self.url_for_update_record(resource_type, id),
            OperationKind::DeleteRecord => self.url_for_delete_record(resource_type, id),
            OperationKind::Query => self.url_for_query(resource_type),
            OperationKind::QueryRecord => self.url_for_query_record(resource_type),
        }
    }
}

fn is_absolute(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://") || path.starts_with("//")
}

/// Stock [`BuildUrl`]: the path of a type is its dasherized plural.
#[derive(Clone)]
pub struct UrlBuilder {
    host: Option<String>,
    namespace: Option<String>,
    inflector: Arc<dyn Inflector>,
}

impl std::fmt::Debug for UrlBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlBuilder")
            .field("host", &self.host)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl UrlBuilder {
    /// Create a builder.
    #[must_use]
    pub fn new(
        host: Option<String>,
        namespace: Option<String>,
        inflector: Arc<dyn Inflector>,
    ) -> Self {
        Self {
            host,
            namespace,
            inflector,
        }
    }
}

impl BuildUrl for UrlBuilder {
    fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn path_for_type(&self, resource_type: &ResourceType) -> String {
        self.inflector
            .pluralize(&self.inflector.dasherize(resource_type.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inflect::DefaultInflector;

    fn builder(host: Option<&str>, namespace: Option<&str>) -> UrlBuilder {
        UrlBuilder::new(
            host.map(ToString::to_string),
            namespace.map(ToString::to_string),
            Arc::new(DefaultInflector::new()),
        )
    }

    fn post() -> ResourceType {
        ResourceType::new("post")
    }

    #[test]
    fn root_relative_without_host() {
        let urls = builder(None, None);
        assert_eq!(
            urls.build_url(&post(), UrlIds::One("1"), OperationKind::FindRecord),
            "/posts/1"
        );
        assert_eq!(
            urls.build_url(&post(), UrlIds::None, OperationKind::FindAll),
            "/posts"
        );
    }

    #[test]
    fn host_then_namespace_then_path_then_id() {
        let urls = builder(Some("https://api.example.com"), Some("api/v1"));
        assert_eq!(
            urls.build_url(&post(), UrlIds::One("1"), OperationKind::UpdateRecord),
            "https://api.example.com/api/v1/posts/1"
        );
    }

    #[test]
    fn namespace_only() {
        let urls = builder(Some("/"), Some("/api/"));
        assert_eq!(
            urls.build_url(&post(), UrlIds::One("1"), OperationKind::DeleteRecord),
            "/api/posts/1"
        );
    }

    #[test]
    fn type_is_dasherized_then_pluralized() {
        let urls = builder(None, None);
        assert_eq!(
            urls.build_url(
                &ResourceType::new("blogCategory"),
                UrlIds::None,
                OperationKind::Query
            ),
            "/blog-categories"
        );
    }

    #[test]
    fn collection_operations_never_carry_ids() {
        let urls = builder(Some("https://api.example.com"), None);
        let ids = vec!["1".to_string(), "2".to_string()];
        for kind in [
            OperationKind::FindAll,
            OperationKind::CreateRecord,
            OperationKind::Query,
            OperationKind::QueryRecord,
        ] {
            assert_eq!(
                urls.build_url(&post(), UrlIds::One("1"), kind),
                "https://api.example.com/posts",
                "{kind}"
            );
        }
        assert_eq!(
            urls.build_url(&post(), UrlIds::Many(&ids), OperationKind::FindMany),
            "https://api.example.com/posts"
        );
    }

    #[test]
    fn ids_are_percent_encoded() {
        let urls = builder(None, None);
        assert_eq!(
            urls.build_url(&post(), UrlIds::One("a/b c"), OperationKind::FindRecord),
            "/posts/a%2Fb%20c"
        );
    }

    #[test]
    fn build_url_is_pure() {
        let urls = builder(Some("https://api.example.com"), Some("v2"));
        let first = urls.build_url(&post(), UrlIds::One("7"), OperationKind::FindRecord);
        let second = urls.build_url(&post(), UrlIds::One("7"), OperationKind::FindRecord);
        assert_eq!(first, second);
    }

    #[test]
    fn url_prefix_resolves_links() {
        let urls = builder(Some("https://api.example.com"), Some("v2"));
        assert_eq!(
            urls.url_prefix(Some("https://cdn.example.com/x"), None),
            "https://cdn.example.com/x"
        );
        assert_eq!(
            urls.url_prefix(Some("/posts/1/comments"), None),
            "https://api.example.com/posts/1/comments"
        );
        assert_eq!(
            urls.url_prefix(Some("comments"), Some("https://api.example.com/v2/posts/1")),
            "https://api.example.com/v2/posts/1/comments"
        );
        assert_eq!(urls.url_prefix(None, None), "https://api.example.com/v2");
    }

    #[test]
    fn overriding_one_hook_keeps_the_others() {
        struct Nested(UrlBuilder);

        impl BuildUrl for Nested {
            fn host(&self) -> Option<&str> {
                self.0.host()
            }

            fn namespace(&self) -> Option<&str> {
                self.0.namespace()
            }

            fn path_for_type(&self, resource_type: &ResourceType) -> String {
                self.0.path_for_type(resource_type)
            }

            fn url_for_query(&self, _resource_type: &ResourceType) -> String {
                "/search".to_string()
            }
        }

        let urls = Nested(builder(None, None));
        assert_eq!(
            urls.build_url(&post(), UrlIds::None, OperationKind::Query),
            "/search"
        );
        assert_eq!(
            urls.build_url(&post(), UrlIds::One("1"), OperationKind::FindRecord),
            "/posts/1"
        );
    }
}
