//! Request coalescing.
//!
//! `findRecord` calls scheduled before a flush are buffered per resource type
//! and query (`include`, `fields[...]` and explicit options), in
//! first-scheduled order. Fetches asking for different queries never share a
//! request. A flush turns every buffered group into as few `findMany`
//! requests as the URL length limit allows and resolves each caller's
//! [`FetchHandle`] with its own record.
//!
//! The buffer is the only state: dropping it (or the adapter owning it)
//! resolves every pending handle with [`Error::Abandoned`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use ferry_core::{
    Error, NormalizedDocument, QueryParams, RecordIdentifier, ResourceObject, ResourceType, Result,
    Snapshot,
};
use futures_util::future::BoxFuture;
use tokio::sync::oneshot;
use tracing::debug;
use url::form_urlencoded;

use crate::query::{QueryContext, build_query};

/// Length of `&filter%5Bid%5D=` (or `?filter%5Bid%5D=`), the parameter
/// holding the ids of a batched lookup.
const FILTER_PARAM_LEN: usize = 16;

/// Length of an encoded `,` between two ids.
const SEPARATOR_LEN: usize = 3;

type Waiter = oneshot::Sender<Result<ResourceObject>>;

/// One buffered id and everyone waiting for it.
#[derive(Debug)]
pub struct PendingFetch {
    id: String,
    snapshot: Snapshot,
    waiters: Vec<Waiter>,
}

impl PendingFetch {
    /// Id of the record.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Snapshot of the first caller.
    #[must_use]
    pub const fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Number of callers waiting for the record.
    #[must_use]
    pub fn waiters(&self) -> usize {
        self.waiters.len()
    }

    /// Hand the result to every waiter.
    pub fn resolve(self, result: &Result<ResourceObject>) {
        for waiter in self.waiters {
            let shared = match result {
                Ok(resource) => Ok(resource.clone()),
                Err(error) => Err(error.share()),
            };
            // The caller may have dropped its handle.
            let _ = waiter.send(shared);
        }
    }

    /// Resolve from a batch response; an absent id is a not-found for this
    /// record only.
    pub fn resolve_from(self, resource_type: &ResourceType, document: &NormalizedDocument) {
        let found = locate(document, resource_type, &self.id).cloned().ok_or_else(|| {
            Error::NotFound {
                resource_type: resource_type.clone(),
                id: self.id.clone(),
            }
        });
        self.resolve(&found);
    }
}

/// Exact type first, then a primary resource of another type (polymorphic
/// responses) with the same id.
fn locate<'a>(
    document: &'a NormalizedDocument,
    resource_type: &ResourceType,
    id: &str,
) -> Option<&'a ResourceObject> {
    document.find(resource_type, id).or_else(|| {
        document
            .primary()
            .into_iter()
            .find(|resource| resource.id == id)
    })
}

/// The buffered fetches of one resource type and query.
#[derive(Debug)]
pub struct CoalescingGroup {
    /// Type of every record in the group.
    pub resource_type: ResourceType,
    /// Query each record would send on its own, shared by the group.
    pub query: QueryParams,
    /// Fetches in first-scheduled order, one per distinct id.
    pub fetches: Vec<PendingFetch>,
}

impl CoalescingGroup {
    /// Ids in first-scheduled order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.fetches.iter().map(|fetch| fetch.id.clone()).collect()
    }
}

/// Buffer of fetches scheduled since the last flush.
#[derive(Debug, Default)]
pub struct Coalescer {
    groups: Vec<CoalescingGroup>,
}

impl Coalescer {
    /// Empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of distinct records buffered.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.groups.iter().map(|group| group.fetches.len()).sum()
    }

    /// Buffer a fetch of the snapshot's record.
    ///
    /// A record already buffered keeps its position; the new caller is
    /// resolved with the same result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the snapshot has no id.
    pub fn schedule(&mut self, snapshot: Snapshot) -> Result<FetchHandle> {
        let Some(id) = snapshot.id().map(ToString::to_string) else {
            return Err(Error::invalid_request(format!(
                "cannot fetch an unsaved {} record",
                snapshot.resource_type()
            )));
        };
        let resource_type = snapshot.resource_type().clone();
        let query = build_query(QueryContext::Record(&snapshot));
        let identifier = RecordIdentifier::new(resource_type.clone(), id.clone());
        let (sender, receiver) = oneshot::channel();

        let index = match self
            .groups
            .iter()
            .position(|group| group.resource_type == resource_type && group.query == query)
        {
            Some(index) => index,
            None => {
                self.groups.push(CoalescingGroup {
                    resource_type: resource_type.clone(),
                    query,
                    fetches: Vec::new(),
                });
                self.groups.len() - 1
            }
        };

        if let Some(group) = self.groups.get_mut(index) {
            match group.fetches.iter_mut().find(|fetch| fetch.id == id) {
                Some(fetch) => {
                    debug!(%identifier, "joined a buffered fetch");
                    fetch.waiters.push(sender);
                }
                None => {
                    debug!(%identifier, position = group.fetches.len(), "fetch buffered");
                    group.fetches.push(PendingFetch {
                        id,
                        snapshot,
                        waiters: vec![sender],
                    });
                }
            }
        }

        Ok(FetchHandle::pending(receiver, identifier))
    }

    /// Take every buffered group, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<CoalescingGroup> {
        std::mem::take(&mut self.groups)
    }
}

/// Split `items` so that the `findMany` URL of each part stays within
/// `max_url_length`.
///
/// `request_url` is the URL the batch is sent to, every query parameter
/// but `filter[id]` included. Order is kept and no part is empty; an id too
/// long on its own still gets a part of its own.
pub fn split_by_url_length<T>(
    items: Vec<T>,
    request_url: &str,
    max_url_length: usize,
    id_of: impl Fn(&T) -> &str,
) -> Vec<Vec<T>> {
    let empty_len = request_url.len() + FILTER_PARAM_LEN;
    let mut parts = Vec::new();
    let mut current: Vec<T> = Vec::new();
    let mut current_len = empty_len;

    for item in items {
        let separator = if current.is_empty() { 0 } else { SEPARATOR_LEN };
        let id_len = form_urlencoded::byte_serialize(id_of(&item).as_bytes())
            .map(str::len)
            .sum::<usize>();
        if !current.is_empty() && current_len + separator + id_len > max_url_length {
            parts.push(std::mem::take(&mut current));
            current_len = empty_len;
        }
        current_len += if current.is_empty() { id_len } else { SEPARATOR_LEN + id_len };
        current.push(item);
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

// ============================================================================
// Fetch Handle
// ============================================================================

enum HandleState {
    Pending {
        receiver: oneshot::Receiver<Result<ResourceObject>>,
        identifier: RecordIdentifier,
    },
    Immediate(BoxFuture<'static, Result<ResourceObject>>),
}

/// Deferred result of a scheduled fetch.
///
/// Resolves with the record once its batch completes, or runs its own
/// request when coalescing is disabled.
pub struct FetchHandle {
    state: HandleState,
}

impl std::fmt::Debug for FetchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.state {
            HandleState::Pending { identifier, .. } => f
                .debug_struct("FetchHandle")
                .field("identifier", identifier)
                .finish_non_exhaustive(),
            HandleState::Immediate(_) => f.debug_struct("FetchHandle").finish_non_exhaustive(),
        }
    }
}

impl FetchHandle {
    fn pending(
        receiver: oneshot::Receiver<Result<ResourceObject>>,
        identifier: RecordIdentifier,
    ) -> Self {
        Self {
            state: HandleState::Pending {
                receiver,
                identifier,
            },
        }
    }

    /// Handle driving its own request.
    #[must_use]
    pub fn immediate(future: BoxFuture<'static, Result<ResourceObject>>) -> Self {
        Self {
            state: HandleState::Immediate(future),
        }
    }

    /// Handle already resolved with `result`.
    #[must_use]
    pub fn ready(result: Result<ResourceObject>) -> Self {
        Self::immediate(Box::pin(std::future::ready(result)))
    }
}

impl Future for FetchHandle {
    type Output = Result<ResourceObject>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            HandleState::Pending {
                receiver,
                identifier,
            } => Pin::new(receiver).poll(cx).map(|received| {
                received.unwrap_or_else(|_| {
                    Err(Error::Abandoned {
                        resource_type: identifier.resource_type.clone(),
                        id: identifier.id().unwrap_or_default().to_string(),
                    })
                })
            }),
            HandleState::Immediate(future) => future.as_mut().poll(cx),
        }
    }
}
