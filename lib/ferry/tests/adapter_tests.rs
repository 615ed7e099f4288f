//! Adapter tests against a scripted in-memory transport.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use ferry::{
    Adapter, AdapterConfig, AdapterErrorKind, Error, FieldSelection, HttpClient, Method,
    OperationKind, PrimaryData, QueryParams, RecordAdapter, RecordIdentifier, Request,
    ResourceType, Response, Result, Snapshot, SnapshotRecordArray, UrlIds,
};
use serde_json::{Value, json};
use url::Url;

// ============================================================================
// Scripted Transport
// ============================================================================

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    url: Url,
    headers: HashMap<String, String>,
    body: Option<Value>,
}

impl Recorded {
    fn path(&self) -> &str {
        self.url.path()
    }

    fn query(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

type Responder = dyn Fn(&Recorded) -> Result<Response<Bytes>> + Send + Sync;

/// Records every request and answers with a responder.
#[derive(Clone)]
struct ScriptedClient {
    log: Arc<Mutex<Vec<Recorded>>>,
    responder: Arc<Responder>,
}

impl ScriptedClient {
    fn new(responder: impl Fn(&Recorded) -> Result<Response<Bytes>> + Send + Sync + 'static) -> Self {
        Self {
            log: Arc::default(),
            responder: Arc::new(responder),
        }
    }

    /// Serves `posts` by id, leaving out the ids in `missing`.
    fn posts(missing: &'static [&'static str]) -> Self {
        Self::new(move |request| {
            let resource = |id: &str| {
                json!({"type": "posts", "id": id, "attributes": {"title": format!("Post {id}")}})
            };
            let segments = request
                .url
                .path_segments()
                .map(Iterator::collect::<Vec<_>>)
                .unwrap_or_default();

            let body = match (request.query("filter[id]"), segments.as_slice()) {
                (Some(ids), _) => json!({
                    "data": ids
                        .split(',')
                        .filter(|id| !missing.contains(id))
                        .map(resource)
                        .collect::<Vec<_>>()
                }),
                (None, [_, id]) => json!({ "data": resource(id) }),
                _ => json!({ "data": [] }),
            };
            Ok(json_response(200, &body))
        })
    }

    /// Answers every request with the same status and body.
    fn status(status: u16, body: Value) -> Self {
        Self::new(move |_| Ok(json_response(status, &body)))
    }

    fn requests(&self) -> Vec<Recorded> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl HttpClient for ScriptedClient {
    async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let recorded = Recorded {
            method: request.method(),
            url: request.url().clone(),
            headers: request.headers().clone(),
            body: request
                .body()
                .map(|body| serde_json::from_slice(body).expect("JSON request body")),
        };
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(recorded.clone());
        (self.responder)(&recorded)
    }
}

fn json_response(status: u16, body: &Value) -> Response<Bytes> {
    let body = if body.is_null() {
        Bytes::new()
    } else {
        Bytes::from(body.to_string())
    };
    Response::new(status, HashMap::new(), body)
}

fn adapter(client: ScriptedClient, config: AdapterConfig) -> Adapter<ScriptedClient> {
    Adapter::new(client, config).expect("adapter")
}

fn coalescing() -> AdapterConfig {
    AdapterConfig::builder()
        .host("https://api.example.com")
        .coalesce_find_requests(true)
        .build()
}

fn post(id: &str) -> Snapshot {
    Snapshot::new(RecordIdentifier::new("post", id))
}

fn post_type() -> ResourceType {
    ResourceType::new("post")
}

// ============================================================================
// Coalescing
// ============================================================================

#[tokio::test]
async fn same_tick_fetches_share_one_request() {
    let client = ScriptedClient::posts(&[]);
    let adapter = adapter(client.clone(), coalescing());

    let first = adapter.schedule_fetch(post("1"));
    let second = adapter.schedule_fetch(post("2"));
    assert_eq!(adapter.flush().await, 1);

    let requests = client.requests();
    let [request] = requests.as_slice() else {
        panic!("expected a single request");
    };
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.path(), "/posts");
    assert_eq!(request.query("filter[id]").as_deref(), Some("1,2"));

    assert_eq!(first.await.expect("first").id, "1");
    let second = second.await.expect("second");
    assert_eq!(second.attributes.get("title"), Some(&json!("Post 2")));
}

#[tokio::test]
async fn fetches_across_ticks_are_not_merged() {
    let client = ScriptedClient::posts(&[]);
    let adapter = adapter(client.clone(), coalescing());

    let first = adapter.schedule_fetch(post("1"));
    assert_eq!(adapter.flush().await, 1);
    assert!(first.await.is_ok());

    let second = adapter.schedule_fetch(post("2"));
    assert_eq!(adapter.flush().await, 1);
    assert!(second.await.is_ok());

    let paths = client
        .requests()
        .iter()
        .map(|request| request.path().to_string())
        .collect::<Vec<_>>();
    assert_eq!(paths, ["/posts/1", "/posts/2"]);
    assert!(client.requests().iter().all(|r| r.query("filter[id]").is_none()));
}

#[tokio::test]
async fn missing_id_is_not_found_for_its_caller_only() {
    let client = ScriptedClient::posts(&["2"]);
    let adapter = adapter(client, coalescing());

    let found = adapter.schedule_fetch(post("1"));
    let missing = adapter.schedule_fetch(post("2"));
    let also_found = adapter.schedule_fetch(post("3"));
    adapter.flush().await;

    assert!(found.await.is_ok());
    assert!(also_found.await.is_ok());
    let Err(Error::NotFound { resource_type, id }) = missing.await else {
        panic!("expected a not-found error");
    };
    assert_eq!(resource_type, post_type());
    assert_eq!(id, "2");
}

#[tokio::test]
async fn batch_failure_reaches_every_caller() {
    let client = ScriptedClient::status(500, json!({"errors": [{"detail": "database down"}]}));
    let adapter = adapter(client, coalescing());

    let first = adapter.schedule_fetch(post("1"));
    let second = adapter.schedule_fetch(post("2"));
    adapter.flush().await;

    for handle in [first, second] {
        let Err(Error::Adapter(error)) = handle.await else {
            panic!("expected an adapter error");
        };
        assert_eq!(error.status(), 500);
        assert!(error.detail().ends_with("database down"));
    }
}

#[tokio::test]
async fn duplicate_ids_are_requested_once() {
    let client = ScriptedClient::posts(&[]);
    let adapter = adapter(client.clone(), coalescing());

    let handles = [
        adapter.schedule_fetch(post("1")),
        adapter.schedule_fetch(post("2")),
        adapter.schedule_fetch(post("1")),
    ];
    assert_eq!(adapter.pending_fetches(), 2);
    adapter.flush().await;

    for handle in handles {
        assert!(handle.await.is_ok());
    }
    let requests = client.requests();
    let [request] = requests.as_slice() else {
        panic!("expected a single request");
    };
    assert_eq!(request.query("filter[id]").as_deref(), Some("1,2"));
}

#[tokio::test]
async fn types_are_batched_separately() {
    let client = ScriptedClient::new(|request| {
        let wire_type = request.path().trim_start_matches('/').to_string();
        let ids = request.query("filter[id]").unwrap_or_default();
        let data = ids
            .split(',')
            .map(|id| json!({"type": wire_type, "id": id}))
            .collect::<Vec<_>>();
        Ok(json_response(200, &json!({ "data": data })))
    });
    let adapter = adapter(client.clone(), coalescing());

    let handles = [
        adapter.schedule_fetch(post("1")),
        adapter.schedule_fetch(Snapshot::new(RecordIdentifier::new("user", "7"))),
        adapter.schedule_fetch(post("2")),
        adapter.schedule_fetch(Snapshot::new(RecordIdentifier::new("user", "8"))),
    ];
    assert_eq!(adapter.flush().await, 2);
    for handle in handles {
        assert!(handle.await.is_ok());
    }

    let mut paths = client
        .requests()
        .iter()
        .map(|request| (request.path().to_string(), request.query("filter[id]")))
        .collect::<Vec<_>>();
    paths.sort();
    assert_eq!(
        paths,
        [
            ("/posts".to_string(), Some("1,2".to_string())),
            ("/users".to_string(), Some("7,8".to_string())),
        ]
    );
}

#[tokio::test]
async fn long_batches_are_split_by_url_length() {
    let client = ScriptedClient::posts(&[]);
    let config = AdapterConfig::builder()
        .host("https://api.example.com")
        .coalesce_find_requests(true)
        .max_url_length(65)
        .build();
    let adapter = adapter(client.clone(), config);

    let handles =
        ["1", "2", "3", "4"].map(|id| adapter.schedule_fetch(post(id).with_include("author")));
    assert_eq!(adapter.flush().await, 2);
    for handle in handles {
        assert!(handle.await.is_ok());
    }

    let requests = client.requests();
    let ids = requests
        .iter()
        .filter_map(|request| request.query("filter[id]"))
        .collect::<Vec<_>>();
    assert_eq!(ids, ["1,2", "3,4"]);
    for request in &requests {
        assert!(request.url.as_str().len() <= 65, "{} is too long", request.url);
    }
}

#[tokio::test]
async fn batches_keep_each_caller_query() {
    let client = ScriptedClient::posts(&[]);
    let adapter = adapter(client.clone(), coalescing());
    let title = FieldSelection::new().with("posts", "title");

    let first =
        adapter.schedule_fetch(post("1").with_include("author").with_fields(title.clone()));
    let second = adapter.schedule_fetch(post("2").with_include("comments"));
    let third = adapter.schedule_fetch(post("3").with_include("author").with_fields(title));
    assert_eq!(adapter.flush().await, 2);

    for handle in [first, second, third] {
        assert!(handle.await.is_ok());
    }

    let mut sent = client
        .requests()
        .iter()
        .map(|request| {
            (
                request.url.path().to_string(),
                request.query("filter[id]"),
                request.query("include"),
                request.query("fields[posts]"),
            )
        })
        .collect::<Vec<_>>();
    sent.sort();
    assert_eq!(
        sent,
        [
            (
                "/posts".to_string(),
                Some("1,3".to_string()),
                Some("author".to_string()),
                Some("title".to_string()),
            ),
            ("/posts/2".to_string(), None, Some("comments".to_string()), None),
        ]
    );
}

#[tokio::test]
async fn find_many_sends_the_union_of_record_queries() {
    let client = ScriptedClient::posts(&[]);
    let adapter = adapter(client.clone(), coalescing());
    let snapshots = [
        post("1").with_include("author"),
        post("2")
            .with_include("comments")
            .with_fields(FieldSelection::new().with("posts", "body")),
    ];
    let ids = ["1".to_string(), "2".to_string()];

    adapter
        .find_many(&post_type(), &ids, &snapshots)
        .await
        .expect("payload");

    let requests = client.requests();
    let [request] = requests.as_slice() else {
        panic!("expected a single request");
    };
    assert_eq!(request.query("include").as_deref(), Some("author,comments"));
    assert_eq!(request.query("fields[posts]").as_deref(), Some("body"));
    assert_eq!(request.query("filter[id]").as_deref(), Some("1,2"));
}

#[tokio::test]
async fn disabled_coalescing_sends_one_request_per_fetch() {
    let client = ScriptedClient::posts(&[]);
    let adapter = adapter(client.clone(), AdapterConfig::default());

    let first = adapter.schedule_fetch(post("1"));
    let second = adapter.schedule_fetch(post("2"));
    assert_eq!(adapter.pending_fetches(), 0);
    assert_eq!(adapter.flush().await, 0);

    assert_eq!(first.await.expect("first").id, "1");
    assert_eq!(second.await.expect("second").id, "2");
    let paths = client
        .requests()
        .iter()
        .map(|request| request.path().to_string())
        .collect::<Vec<_>>();
    assert_eq!(paths, ["/posts/1", "/posts/2"]);
}

#[tokio::test]
async fn auto_flush_batches_one_tick() {
    let client = ScriptedClient::posts(&[]);
    let adapter = Adapter::builder(client.clone())
        .config(coalescing())
        .auto_flush(true)
        .build()
        .expect("adapter");

    let first = adapter.schedule_fetch(post("1"));
    let second = adapter.schedule_fetch(post("2"));
    assert!(first.await.is_ok());
    assert!(second.await.is_ok());

    let requests = client.requests();
    let [request] = requests.as_slice() else {
        panic!("expected a single request");
    };
    assert_eq!(request.query("filter[id]").as_deref(), Some("1,2"));
}

#[tokio::test]
async fn dropped_adapter_abandons_pending_fetches() {
    let adapter = adapter(ScriptedClient::posts(&[]), coalescing());
    let handle = adapter.schedule_fetch(post("1"));
    drop(adapter);

    let Err(Error::Abandoned { id, .. }) = handle.await else {
        panic!("expected an abandoned fetch");
    };
    assert_eq!(id, "1");
}

// ============================================================================
// Operations
// ============================================================================

#[tokio::test]
async fn find_record_sends_json_api_headers_and_query() {
    let client = ScriptedClient::posts(&[]);
    let config = AdapterConfig::builder()
        .host("https://api.example.com")
        .namespace("api/v1")
        .header("X-Tenant", "acme")
        .build();
    let adapter = adapter(client.clone(), config);

    let snapshot = post("1")
        .with_include("author")
        .with_fields(ferry::FieldSelection::new().with("posts", "title"));
    let payload = adapter
        .find_record(&post_type(), "1", &snapshot)
        .await
        .expect("payload");
    assert_eq!(payload.pointer("/data/id"), Some(&json!("1")));

    let requests = client.requests();
    let [request] = requests.as_slice() else {
        panic!("expected a single request");
    };
    assert_eq!(request.url.host_str(), Some("api.example.com"));
    assert_eq!(request.path(), "/api/v1/posts/1");
    assert_eq!(request.query("include").as_deref(), Some("author"));
    assert_eq!(request.query("fields[posts]").as_deref(), Some("title"));
    assert_eq!(request.headers.get("Accept").map(String::as_str), Some("application/vnd.api+json"));
    assert_eq!(request.headers.get("X-Tenant").map(String::as_str), Some("acme"));
    assert!(request.body.is_none());
}

#[tokio::test]
async fn find_all_sends_since_and_include() {
    let client = ScriptedClient::posts(&[]);
    let adapter = adapter(client.clone(), AdapterConfig::default());

    let array = SnapshotRecordArray::new("post").with_include("author");
    adapter
        .find_all(&post_type(), Some("42"), &array)
        .await
        .expect("payload");

    let requests = client.requests();
    let [request] = requests.as_slice() else {
        panic!("expected a single request");
    };
    assert_eq!(request.path(), "/posts");
    assert_eq!(request.query("since").as_deref(), Some("42"));
    assert_eq!(request.query("include").as_deref(), Some("author"));
}

#[tokio::test]
async fn relationship_links_resolve_against_the_record() {
    let client = ScriptedClient::status(200, json!({"data": []}));
    let config = AdapterConfig::builder().host("https://api.example.com").build();
    let adapter = adapter(client.clone(), config);
    let snapshot = post("1");

    adapter
        .find_has_many(&snapshot, "comments", "comments")
        .await
        .expect("relative link");
    adapter
        .find_has_many(&snapshot, "/comments?post=1", "comments")
        .await
        .expect("root-relative link");
    adapter
        .find_belongs_to(&snapshot, "https://users.example.com/users/9", "author")
        .await
        .expect("absolute link");

    let urls = client
        .requests()
        .iter()
        .map(|request| request.url.to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        urls,
        [
            "https://api.example.com/posts/1/comments",
            "https://api.example.com/comments?post=1",
            "https://users.example.com/users/9",
        ]
    );
}

#[tokio::test]
async fn create_update_and_delete_use_their_verbs() {
    let client = ScriptedClient::new(|request| match request.method {
        Method::Delete => Ok(json_response(204, &Value::Null)),
        _ => Ok(json_response(
            200,
            &json!({"data": {"type": "posts", "id": "1", "attributes": {"title": "Rust"}}}),
        )),
    });
    let adapter = adapter(client.clone(), AdapterConfig::default());

    let draft = Snapshot::new(RecordIdentifier::unsaved("post")).with_attribute("title", "Rust");
    adapter
        .create_record(&post_type(), &draft)
        .await
        .expect("create");

    let saved = post("1").with_attribute("publishedAt", "2024-05-01");
    adapter
        .update_record(&post_type(), &saved)
        .await
        .expect("update");

    let deleted = adapter
        .delete_record(&post_type(), &saved)
        .await
        .expect("delete");
    assert_eq!(deleted, Value::Null);

    let requests = client.requests();
    let [create, update, delete] = requests.as_slice() else {
        panic!("expected three requests");
    };

    assert_eq!(create.method, Method::Post);
    assert_eq!(create.path(), "/posts");
    assert_eq!(
        create.headers.get("Content-Type").map(String::as_str),
        Some("application/vnd.api+json")
    );
    assert_eq!(
        create.body,
        Some(json!({"data": {"type": "posts", "attributes": {"title": "Rust"}}}))
    );

    assert_eq!(update.method, Method::Patch);
    assert_eq!(update.path(), "/posts/1");
    assert_eq!(update.body, Some(json!({
                "data": {"type": "posts", "id": "1", "attributes": {"published-at": "2024-05-01"}}
            })));

    assert_eq!(delete.method, Method::Delete);
    assert_eq!(delete.path(), "/posts/1");
    assert!(delete.body.is_none());
}

#[tokio::test]
async fn query_sends_the_caller_query() {
    let client = ScriptedClient::status(200, json!({"data": []}));
    let adapter = adapter(client.clone(), AdapterConfig::default());
    let query = QueryParams::new()
        .with("filter[title]", "rust")
        .with("page[size]", "5");

    adapter.query(&post_type(), &query).await.expect("query");
    adapter
        .query_record(&post_type(), &query)
        .await
        .expect("query record");

    for request in client.requests() {
        assert_eq!(request.path(), "/posts");
        assert_eq!(request.query("filter[title]").as_deref(), Some("rust"));
        assert_eq!(request.query("page[size]").as_deref(), Some("5"));
    }
}

#[test]
fn build_url_is_pure() {
    let adapter = adapter(
        ScriptedClient::posts(&[]),
        AdapterConfig::builder().namespace("api").build(),
    );
    let blog_post = ResourceType::new("blogPost");

    for _ in 0..3 {
        assert_eq!(
            adapter.build_url(&blog_post, UrlIds::One("a b"), OperationKind::FindRecord),
            "/api/blog-posts/a%20b"
        );
    }
}

// ============================================================================
// Classification
// ============================================================================

#[tokio::test]
async fn unprocessable_entity_is_invalid() {
    let client = ScriptedClient::status(
        422,
        json!({
            "errors": [
                {"detail": "can't be blank", "source": {"pointer": "/data/attributes/title"}},
                {"detail": "is past", "source": {"pointer": "/data/attributes/published-at"}},
                {"detail": "is locked"}
            ],
            "data": {"type": "posts", "id": "1"}
        }),
    );
    let adapter = adapter(client, AdapterConfig::default());

    let result = adapter.update_record(&post_type(), &post("1")).await;

    let Err(Error::Invalid(invalid)) = result else {
        panic!("expected a validation error");
    };
    assert_eq!(invalid.errors().len(), 3);
    let by_attribute = adapter.errors_by_attribute(&post_type(), &invalid);
    assert_eq!(by_attribute.get("title"), Some(&vec!["can't be blank".to_string()]));
    assert_eq!(by_attribute.get("publishedAt"), Some(&vec!["is past".to_string()]));
    assert_eq!(by_attribute.get("base"), Some(&vec!["is locked".to_string()]));
    assert!(!by_attribute.contains_key("published-at"));
}

#[tokio::test]
async fn server_error_is_adapter_error() {
    let client = ScriptedClient::status(500, Value::Null);
    let adapter = adapter(client, AdapterConfig::default());

    let result = adapter.find_record(&post_type(), "1", &post("1")).await;

    let Err(Error::Adapter(error)) = result else {
        panic!("expected an adapter error");
    };
    assert_eq!(error.status(), 500);
    assert_eq!(error.kind(), AdapterErrorKind::Server);
    assert!(!error.detail().is_empty());
}

#[tokio::test]
async fn not_found_is_reported_as_such() {
    let client = ScriptedClient::status(404, json!({"errors": [{"title": "Not Found"}]}));
    let adapter = adapter(client, AdapterConfig::default());

    let error = adapter
        .find_record(&post_type(), "1", &post("1"))
        .await
        .expect_err("404");
    assert!(error.is_not_found());
    assert_eq!(error.status(), Some(404));
}

#[tokio::test]
async fn transport_failure_has_status_zero() {
    let client = ScriptedClient::new(|_| Err(Error::connection("connection refused")));
    let adapter = adapter(client, AdapterConfig::default());

    let result = adapter.find_record(&post_type(), "1", &post("1")).await;

    let Err(Error::Adapter(error)) = result else {
        panic!("expected an adapter error");
    };
    assert_eq!(error.status(), 0);
    assert_eq!(error.kind(), AdapterErrorKind::Network);
    assert!(error.detail().contains("connection refused"));
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn serialize_then_normalize_keeps_attribute_names() {
    let adapter = adapter(ScriptedClient::posts(&[]), AdapterConfig::default());
    let snapshot = post("1")
        .with_attribute("title", "Rust")
        .with_attribute("publishedAt", "2024-05-01")
        .with_attribute("commentCount", 3);

    let payload = adapter
        .serialize_into_hash(&post_type(), &snapshot)
        .expect("serialize");
    let document = adapter
        .normalize_response(&post_type(), payload, OperationKind::FindRecord)
        .expect("normalize");

    let PrimaryData::Single(Some(resource)) = document.data else {
        panic!("expected a single resource");
    };
    assert_eq!(
        resource.attributes.keys().collect::<Vec<_>>(),
        ["commentCount", "publishedAt", "title"]
    );
}
