//! The adapter: record operations mapped onto JSON:API requests.
//!
//! [`RecordAdapter`] is what the store calls. [`Adapter`] implements it on
//! top of any [`HttpClient`], wiring together the URL builder, the query
//! builder, the field tracker, the coalescer, dispatch and the serializer.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use ferry_core::{
    Error, FieldSelection, HttpClient, InvalidError, JSON_API_MEDIA_TYPE, Method,
    NormalizedDocument, OperationKind, PrimaryData, QueryParams, RecordIdentifier, Request,
    ResourceObject, ResourceType, Result, Snapshot, SnapshotRecordArray,
};
use futures_util::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::coalesce::{Coalescer, FetchHandle, PendingFetch, split_by_url_length};
use crate::config::AdapterConfig;
use crate::dispatch::dispatch;
use crate::inflect::{DefaultInflector, Inflector};
use crate::query::{QueryContext, build_query};
use crate::schema::{SchemaRegistry, SchemaSource};
use crate::serializer::{DasherizedKeys, JsonApiSerializer, KeyTransform, RecordSerializer};
use crate::tracking::FieldTracker;
use crate::url_builder::{BuildUrl, UrlBuilder, UrlIds};

// ============================================================================
// Operation Contract
// ============================================================================

/// Record operations, each resolving to the raw response payload or a
/// classified error.
pub trait RecordAdapter: Send + Sync {
    /// `GET /<type>/<id>`.
    fn find_record(
        &self,
        resource_type: &ResourceType,
        id: &str,
        snapshot: &Snapshot,
    ) -> impl Future<Output = Result<Value>> + Send;

    /// `GET /<type>`, with `since` when the store has a token.
    fn find_all(
        &self,
        resource_type: &ResourceType,
        since: Option<&str>,
        array: &SnapshotRecordArray,
    ) -> impl Future<Output = Result<Value>> + Send;

    /// `GET /<type>?filter[id]=<ids>`.
    fn find_many(
        &self,
        resource_type: &ResourceType,
        ids: &[String],
        snapshots: &[Snapshot],
    ) -> impl Future<Output = Result<Value>> + Send;

    /// `GET` the related link of a belongs-to relationship.
    fn find_belongs_to(
        &self,
        snapshot: &Snapshot,
        link: &str,
        relationship: &str,
    ) -> impl Future<Output = Result<Value>> + Send;

    /// `GET` the related link of a has-many relationship.
    fn find_has_many(
        &self,
        snapshot: &Snapshot,
        link: &str,
        relationship: &str,
    ) -> impl Future<Output = Result<Value>> + Send;

    /// `POST /<type>` with the serialized record.
    fn create_record(
        &self,
        resource_type: &ResourceType,
        snapshot: &Snapshot,
    ) -> impl Future<Output = Result<Value>> + Send;

    /// `PATCH /<type>/<id>` with the serialized record.
    fn update_record(
        &self,
        resource_type: &ResourceType,
        snapshot: &Snapshot,
    ) -> impl Future<Output = Result<Value>> + Send;

    /// `DELETE /<type>/<id>`.
    fn delete_record(
        &self,
        resource_type: &ResourceType,
        snapshot: &Snapshot,
    ) -> impl Future<Output = Result<Value>> + Send;

    /// `GET /<type>?<query>`, answered with a collection.
    fn query(
        &self,
        resource_type: &ResourceType,
        query: &QueryParams,
    ) -> impl Future<Output = Result<Value>> + Send;

    /// `GET /<type>?<query>`, answered with a single record.
    fn query_record(
        &self,
        resource_type: &ResourceType,
        query: &QueryParams,
    ) -> impl Future<Output = Result<Value>> + Send;
}

// ============================================================================
// Adapter
// ============================================================================

struct Inner<C> {
    client: C,
    config: AdapterConfig,
    origin: Url,
    urls: Arc<dyn BuildUrl>,
    serializer: Arc<dyn RecordSerializer>,
    tracker: Mutex<FieldTracker>,
    coalescer: Mutex<Coalescer>,
    auto_flush: bool,
}

/// JSON:API adapter over an [`HttpClient`].
///
/// Cloning is cheap; clones share the field history and the coalescing
/// buffer.
///
/// # Example
///
/// ```no_run
/// use ferry::{Adapter, AdapterConfig, HyperClient, RecordAdapter};
/// use ferry::prelude::*;
///
/// # async fn example() -> ferry::Result<()> {
/// let config = AdapterConfig::builder()
///     .host("https://api.example.com")
///     .namespace("api/v1")
///     .build();
/// let adapter = Adapter::new(HyperClient::new(), config)?;
///
/// let snapshot = Snapshot::new(RecordIdentifier::new("post", "1"));
/// let payload = adapter
///     .find_record(&ResourceType::new("post"), "1", &snapshot)
///     .await?;
/// # drop(payload);
/// # Ok(())
/// # }
/// ```
pub struct Adapter<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for Adapter<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> std::fmt::Debug for Adapter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("config", &self.inner.config)
            .field("origin", &self.inner.origin.as_str())
            .finish_non_exhaustive()
    }
}

impl<C> Adapter<C> {
    /// Create a new adapter builder.
    #[must_use]
    pub fn builder(client: C) -> AdapterBuilder<C> {
        AdapterBuilder::new(client)
    }

    /// Create an adapter with the stock collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the
    /// configured origin is not an absolute URL.
    pub fn new(client: C, config: AdapterConfig) -> Result<Self> {
        Self::builder(client).config(config).build()
    }

    /// The adapter configuration.
    #[must_use]
    pub fn config(&self) -> &AdapterConfig {
        &self.inner.config
    }

    /// The underlying transport.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.inner.client
    }

    /// URL of an operation.
    #[must_use]
    pub fn build_url(
        &self,
        resource_type: &ResourceType,
        ids: UrlIds<'_>,
        kind: OperationKind,
    ) -> String {
        self.inner.urls.build_url(resource_type, ids, kind)
    }

    /// Build the request descriptor of an operation.
    ///
    /// `Accept` and the configured headers are always set; a body also sets
    /// `Content-Type`. Relative URLs are resolved against the origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be resolved or the body cannot be
    /// serialized.
    pub fn request(
        &self,
        method: Method,
        url: &str,
        query: &QueryParams,
        body: Option<&Value>,
    ) -> Result<Request<Bytes>> {
        let url = self.resolve_url(url)?;
        let headers = self
            .inner
            .config
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()));

        let builder = Request::<Bytes>::builder(method, url)
            .header("Accept", JSON_API_MEDIA_TYPE)
            .headers(headers)
            .query_params(query);
        let builder = match body {
            Some(document) => builder.json_api(document)?,
            None => builder,
        };
        Ok(builder.build())
    }

    fn resolve_url(&self, url: &str) -> Result<Url> {
        match Url::parse(url) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(self.inner.origin.join(url)?),
            Err(error) => Err(error.into()),
        }
    }

    /// Serialize a record into a request document.
    ///
    /// # Errors
    ///
    /// Returns an error if the serializer rejects the snapshot.
    pub fn serialize_into_hash(
        &self,
        resource_type: &ResourceType,
        snapshot: &Snapshot,
    ) -> Result<Value> {
        self.inner
            .serializer
            .serialize_into_hash(resource_type, snapshot)
    }

    /// Normalize a response payload of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPayload`]
    /// for a malformed document.
    pub fn normalize_response(
        &self,
        resource_type: &ResourceType,
        payload: Value,
        kind: OperationKind,
    ) -> Result<NormalizedDocument> {
        self.inner
            .serializer
            .normalize_response(resource_type, payload, kind)
    }

    /// Validation messages of a rejected record, keyed by attribute name
    /// rather than by wire key.
    #[must_use]
    pub fn errors_by_attribute(
        &self,
        resource_type: &ResourceType,
        error: &InvalidError,
    ) -> BTreeMap<String, Vec<String>> {
        self.inner.serializer.extract_errors(resource_type, error)
    }

    fn tracker(&self) -> MutexGuard<'_, FieldTracker> {
        self.inner
            .tracker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn coalescer(&self) -> MutexGuard<'_, Coalescer> {
        self.inner
            .coalescer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // Reload Hooks
    // ========================================================================

    /// Whether a loaded record must be fetched again before use.
    ///
    /// Only sparse field tracking can ask for it: `true` when the snapshot
    /// requests fields no earlier request covered. Always `false` when
    /// tracking is disabled or no fields are requested.
    #[must_use]
    pub fn should_reload_record(&self, snapshot: &Snapshot) -> bool {
        let Some(fields) = snapshot.requested_fields() else {
            return false;
        };
        self.tracker().should_refetch(&snapshot.identifier, fields)
    }

    /// Whether a loaded record is refreshed in the background.
    #[must_use]
    pub fn should_background_reload_record(&self, _snapshot: &Snapshot) -> bool {
        true
    }

    /// Whether `findAll` must block on the network: only when nothing of
    /// the type is loaded yet.
    #[must_use]
    pub fn should_reload_all(&self, array: &SnapshotRecordArray) -> bool {
        array.is_empty()
    }

    /// Whether `findAll` is refreshed in the background.
    #[must_use]
    pub fn should_background_reload_all(&self, _array: &SnapshotRecordArray) -> bool {
        true
    }

    /// Field selections requested so far for a record.
    #[must_use]
    pub fn field_history(&self, record: &RecordIdentifier) -> Vec<FieldSelection> {
        self.tracker().history(record).to_vec()
    }

    /// The store unloaded a record: drop its field history.
    pub fn unload_record(&self, record: &RecordIdentifier) {
        if self.tracker().forget(record).is_some() {
            debug!(%record, "field history dropped");
        }
    }

    // ========================================================================
    // Coalescing
    // ========================================================================

    /// Number of distinct records waiting for the next flush.
    #[must_use]
    pub fn pending_fetches(&self) -> usize {
        self.coalescer().pending()
    }

    /// Split snapshots into `findMany` groups: one group per type and
    /// query, cut so that no URL exceeds `maxURLLength`. Unsaved snapshots
    /// are skipped.
    #[must_use]
    pub fn group_records_for_find_many(&self, snapshots: &[Snapshot]) -> Vec<Vec<Snapshot>> {
        let mut groups: Vec<(ResourceType, QueryParams, Vec<Snapshot>)> = Vec::new();
        for snapshot in snapshots.iter().filter(|snapshot| snapshot.id().is_some()) {
            let resource_type = snapshot.resource_type();
            let query = build_query(QueryContext::Record(snapshot));
            let existing = groups.iter_mut().find(|(group_type, group_query, _)| {
                group_type == resource_type && *group_query == query
            });
            match existing {
                Some((_, _, group)) => group.push(snapshot.clone()),
                None => groups.push((resource_type.clone(), query, vec![snapshot.clone()])),
            }
        }

        groups
            .into_iter()
            .flat_map(|(resource_type, query, group)| {
                let ids = group
                    .iter()
                    .filter_map(|snapshot| snapshot.id().map(ToString::to_string))
                    .collect::<Vec<_>>();
                let request_url = self.batch_request_url(&resource_type, &ids, &query);
                split_by_url_length(group, &request_url, self.inner.config.max_url_length, |s| {
                    s.id().unwrap_or_default()
                })
            })
            .collect()
    }

    /// URL a batch of `ids` is sent to, without its `filter[id]` parameter.
    fn batch_request_url(
        &self,
        resource_type: &ResourceType,
        ids: &[String],
        query: &QueryParams,
    ) -> String {
        let url = self.build_url(resource_type, UrlIds::Many(ids), OperationKind::FindMany);
        self.request(Method::Get, &url, query, None)
            .map_or(url, |request| request.url().to_string())
    }
}

impl<C: HttpClient + 'static> Adapter<C> {
    async fn send(
        &self,
        kind: OperationKind,
        resource_type: &ResourceType,
        url: &str,
        query: &QueryParams,
        body: Option<&Value>,
    ) -> Result<Value> {
        debug!(operation = %kind, %resource_type, url, "building request");
        let request = self.request(kind.method(), url, query, body)?;
        dispatch(&self.inner.client, request).await.into_result()
    }

    /// Fetch the snapshot's record, through the coalescing buffer when
    /// coalescing is enabled.
    ///
    /// With coalescing, nothing is sent until [`flush`](Self::flush) (or the
    /// automatic flush, see [`AdapterBuilder::auto_flush`]). Without it, the
    /// handle sends its own `findRecord` request when polled.
    pub fn schedule_fetch(&self, snapshot: Snapshot) -> FetchHandle {
        if !self.inner.config.coalesce_find_requests {
            let adapter = self.clone();
            return FetchHandle::immediate(Box::pin(async move {
                adapter.fetch_record(snapshot).await
            }));
        }

        let (scheduled, first) = {
            let mut coalescer = self.coalescer();
            let first = coalescer.is_empty();
            (coalescer.schedule(snapshot), first)
        };

        match scheduled {
            Ok(handle) => {
                if first && self.inner.auto_flush {
                    self.spawn_flush();
                }
                handle
            }
            Err(error) => FetchHandle::ready(Err(error)),
        }
    }

    fn spawn_flush(&self) {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let adapter = self.clone();
                runtime.spawn(async move {
                    tokio::task::yield_now().await;
                    adapter.flush().await;
                });
            }
            Err(_) => warn!("no tokio runtime, buffered fetches wait for an explicit flush"),
        }
    }

    /// Dispatch every buffered fetch.
    ///
    /// Each group becomes one `findMany` request per URL-length split, or a
    /// `findRecord` request when it holds a single record. Requests run
    /// concurrently and each resolves its own handles. Returns the number of
    /// requests dispatched.
    pub async fn flush(&self) -> usize {
        let groups = self.coalescer().take();
        if groups.is_empty() {
            return 0;
        }

        let mut batches = Vec::new();
        for group in groups {
            let ids = group.ids();
            let request_url = self.batch_request_url(&group.resource_type, &ids, &group.query);
            let parts = split_by_url_length(
                group.fetches,
                &request_url,
                self.inner.config.max_url_length,
                PendingFetch::id,
            );
            debug!(
                resource_type = %group.resource_type,
                records = ids.len(),
                requests = parts.len(),
                "flushing coalesced fetches"
            );
            for part in parts {
                batches.push(self.fetch_batch(group.resource_type.clone(), part));
            }
        }

        let dispatched = batches.len();
        join_all(batches).await;
        dispatched
    }

    async fn fetch_batch(&self, resource_type: ResourceType, fetches: Vec<PendingFetch>) {
        let result = if let [fetch] = fetches.as_slice() {
            self.find_record(&resource_type, fetch.id(), fetch.snapshot())
                .await
                .and_then(|payload| {
                    self.normalize_response(&resource_type, payload, OperationKind::FindRecord)
                })
        } else {
            let ids = fetches
                .iter()
                .map(|fetch| fetch.id().to_string())
                .collect::<Vec<_>>();
            let snapshots = fetches
                .iter()
                .map(|fetch| fetch.snapshot().clone())
                .collect::<Vec<_>>();
            self.find_many(&resource_type, &ids, &snapshots)
                .await
                .and_then(|payload| {
                    self.normalize_response(&resource_type, payload, OperationKind::FindMany)
                })
        };

        match result {
            Ok(document) => {
                for fetch in fetches {
                    fetch.resolve_from(&resource_type, &document);
                }
            }
            Err(error) => {
                debug!(%resource_type, records = fetches.len(), %error, "batch failed");
                let failed = Err(error);
                for fetch in fetches {
                    fetch.resolve(&failed);
                }
            }
        }
    }

    async fn fetch_record(&self, snapshot: Snapshot) -> Result<ResourceObject> {
        let resource_type = snapshot.resource_type().clone();
        let Some(id) = snapshot.id() else {
            return Err(Error::invalid_request(format!(
                "cannot fetch an unsaved {resource_type} record"
            )));
        };

        let payload = self.find_record(&resource_type, id, &snapshot).await?;
        let document = self.normalize_response(&resource_type, payload, OperationKind::FindRecord)?;
        match document.data {
            PrimaryData::Single(Some(resource)) => Ok(resource),
            _ => Err(Error::NotFound {
                resource_type,
                id: id.to_string(),
            }),
        }
    }

    fn record_url(&self, snapshot: &Snapshot, kind: OperationKind) -> String {
        let ids = snapshot.id().map_or(UrlIds::None, UrlIds::One);
        self.build_url(snapshot.resource_type(), ids, kind)
    }
}

impl<C: HttpClient + 'static> RecordAdapter for Adapter<C> {
    async fn find_record(
        &self,
        resource_type: &ResourceType,
        id: &str,
        snapshot: &Snapshot,
    ) -> Result<Value> {
        let kind = OperationKind::FindRecord;
        let url = self.build_url(resource_type, UrlIds::One(id), kind);
        let query = build_query(QueryContext::Record(snapshot));
        self.send(kind, resource_type, &url, &query, None).await
    }

    async fn find_all(
        &self,
        resource_type: &ResourceType,
        since: Option<&str>,
        array: &SnapshotRecordArray,
    ) -> Result<Value> {
        let kind = OperationKind::FindAll;
        let url = self.build_url(resource_type, UrlIds::None, kind);
        let query = build_query(QueryContext::RecordArray { array, since });
        self.send(kind, resource_type, &url, &query, None).await
    }

    async fn find_many(
        &self,
        resource_type: &ResourceType,
        ids: &[String],
        snapshots: &[Snapshot],
    ) -> Result<Value> {
        let kind = OperationKind::FindMany;
        let url = self.build_url(resource_type, UrlIds::Many(ids), kind);
        let query = build_query(QueryContext::Batch { ids, snapshots });
        self.send(kind, resource_type, &url, &query, None).await
    }

    async fn find_belongs_to(
        &self,
        snapshot: &Snapshot,
        link: &str,
        relationship: &str,
    ) -> Result<Value> {
        let kind = OperationKind::FindBelongsTo;
        let parent = self.record_url(snapshot, kind);
        let url = self.inner.urls.url_prefix(Some(link), Some(&parent));
        debug!(record = %snapshot.identifier, relationship, "following belongs-to link");
        self.send(kind, snapshot.resource_type(), &url, &QueryParams::new(), None)
            .await
    }

    async fn find_has_many(
        &self,
        snapshot: &Snapshot,
        link: &str,
        relationship: &str,
    ) -> Result<Value> {
        let kind = OperationKind::FindHasMany;
        let parent = self.record_url(snapshot, kind);
        let url = self.inner.urls.url_prefix(Some(link), Some(&parent));
        debug!(record = %snapshot.identifier, relationship, "following has-many link");
        self.send(kind, snapshot.resource_type(), &url, &QueryParams::new(), None)
            .await
    }

    async fn create_record(
        &self,
        resource_type: &ResourceType,
        snapshot: &Snapshot,
    ) -> Result<Value> {
        let kind = OperationKind::CreateRecord;
        let url = self.build_url(resource_type, UrlIds::None, kind);
        let body = self.serialize_into_hash(resource_type, snapshot)?;
        self.send(kind, resource_type, &url, &QueryParams::new(), Some(&body))
            .await
    }

    async fn update_record(
        &self,
        resource_type: &ResourceType,
        snapshot: &Snapshot,
    ) -> Result<Value> {
        let kind = OperationKind::UpdateRecord;
        let ids = snapshot.id().map_or(UrlIds::None, UrlIds::One);
        let url = self.build_url(resource_type, ids, kind);
        let body = self.serialize_into_hash(resource_type, snapshot)?;
        self.send(kind, resource_type, &url, &QueryParams::new(), Some(&body))
            .await
    }

    async fn delete_record(
        &self,
        resource_type: &ResourceType,
        snapshot: &Snapshot,
    ) -> Result<Value> {
        let kind = OperationKind::DeleteRecord;
        let ids = snapshot.id().map_or(UrlIds::None, UrlIds::One);
        let url = self.build_url(resource_type, ids, kind);
        self.send(kind, resource_type, &url, &QueryParams::new(), None)
            .await
    }

    async fn query(&self, resource_type: &ResourceType, query: &QueryParams) -> Result<Value> {
        let kind = OperationKind::Query;
        let url = self.build_url(resource_type, UrlIds::None, kind);
        let query = build_query(QueryContext::Query(query));
        self.send(kind, resource_type, &url, &query, None).await
    }

    async fn query_record(
        &self,
        resource_type: &ResourceType,
        query: &QueryParams,
    ) -> Result<Value> {
        let kind = OperationKind::QueryRecord;
        let url = self.build_url(resource_type, UrlIds::None, kind);
        let query = build_query(QueryContext::Query(query));
        self.send(kind, resource_type, &url, &query, None).await
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Adapter`].
///
/// Every collaborator is optional; the stock one is used when unset.
pub struct AdapterBuilder<C> {
    client: C,
    config: AdapterConfig,
    inflector: Option<Arc<dyn Inflector>>,
    schema: Option<Arc<dyn SchemaSource>>,
    keys: Option<Arc<dyn KeyTransform>>,
    urls: Option<Arc<dyn BuildUrl>>,
    serializer: Option<Arc<dyn RecordSerializer>>,
    auto_flush: bool,
}

impl<C> std::fmt::Debug for AdapterBuilder<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterBuilder")
            .field("config", &self.config)
            .field("auto_flush", &self.auto_flush)
            .finish_non_exhaustive()
    }
}

impl<C> AdapterBuilder<C> {
    /// Builder with the default configuration.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self {
            client,
            config: AdapterConfig::default(),
            inflector: None,
            schema: None,
            keys: None,
            urls: None,
            serializer: None,
            auto_flush: false,
        }
    }

    /// Set the configuration.
    #[must_use]
    pub fn config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    /// Inflector of the stock URL builder and key transform.
    #[must_use]
    pub fn inflector(mut self, inflector: Arc<dyn Inflector>) -> Self {
        self.inflector = Some(inflector);
        self
    }

    /// Schema of the stock serializer.
    #[must_use]
    pub fn schema(mut self, schema: Arc<dyn SchemaSource>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Key transform of the stock serializer.
    #[must_use]
    pub fn key_transform(mut self, keys: Arc<dyn KeyTransform>) -> Self {
        self.keys = Some(keys);
        self
    }

    /// Replace the URL builder; `host` and `namespace` of the configuration
    /// are then ignored.
    #[must_use]
    pub fn url_builder(mut self, urls: Arc<dyn BuildUrl>) -> Self {
        self.urls = Some(urls);
        self
    }

    /// Replace the serializer.
    #[must_use]
    pub fn serializer(mut self, serializer: Arc<dyn RecordSerializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// Flush the coalescing buffer automatically: the first fetch buffered
    /// spawns a task that flushes once the scheduling task yields.
    #[must_use]
    pub const fn auto_flush(mut self, enabled: bool) -> Self {
        self.auto_flush = enabled;
        self
    }

    /// Build the adapter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the
    /// configured origin is not an absolute URL.
    pub fn build(self) -> Result<Adapter<C>> {
        let origin = Url::parse(&self.config.origin)?;

        let inflector: Arc<dyn Inflector> = match self.inflector {
            Some(inflector) => inflector,
            None => Arc::new(DefaultInflector::new()),
        };
        let urls: Arc<dyn BuildUrl> = match self.urls {
            Some(urls) => urls,
            None => Arc::new(UrlBuilder::new(
                self.config.host.clone(),
                self.config.namespace.clone(),
                Arc::clone(&inflector),
            )),
        };
        let serializer: Arc<dyn RecordSerializer> = match self.serializer {
            Some(serializer) => serializer,
            None => {
                let keys: Arc<dyn KeyTransform> = match self.keys {
                    Some(keys) => keys,
                    None => Arc::new(DasherizedKeys::new(inflector)),
                };
                let schema: Arc<dyn SchemaSource> = match self.schema {
                    Some(schema) => schema,
                    None => Arc::new(SchemaRegistry::new()),
                };
                Arc::new(JsonApiSerializer::new(keys, schema))
            }
        };

        let tracker = FieldTracker::new(self.config.supports_json_api_fields);
        Ok(Adapter {
            inner: Arc::new(Inner {
                client: self.client,
                config: self.config,
                origin,
                urls,
                serializer,
                tracker: Mutex::new(tracker),
                coalescer: Mutex::new(Coalescer::new()),
                auto_flush: self.auto_flush,
            }),
        })
    }
}
