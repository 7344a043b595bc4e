// src/api/cache.rs
//! In-process, single-flight document cache.
//!
//! Keyed by `(document type, CID)`. Concurrent requests for the same key
//! share one underlying fetch and its outcome. A successful payload is
//! kept for the life of the cache; a failure is handed to every waiter of
//! that fetch and then forgotten, so the next request fetches again.

use super::DocumentSource;
use crate::error::FetchError;
use crate::types::{Cid, DocumentType};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

type CacheKey = (DocumentType, Cid);

/// Outcome of one underlying fetch, as seen by its waiters.
type InFlightResult = Result<Value, FetchError>;

type InFlightSender = Arc<watch::Sender<Option<InFlightResult>>>;

/// Decorates any [`DocumentSource`] with the cache.
pub struct DocumentCache<S> {
    inner: S,
    ready: DashMap<CacheKey, Value>,
    in_flight: DashMap<CacheKey, InFlightSender>,
}

enum Role {
    Fetcher(InFlightSender),
    Waiter(watch::Receiver<Option<InFlightResult>>),
}

/// Clears the in-flight marker when the fetching future finishes or is
/// dropped mid-fetch. Waiters of a dropped fetch see a closed channel.
struct InFlightGuard<'a> {
    key: CacheKey,
    map: &'a DashMap<CacheKey, InFlightSender>,
    tx: InFlightSender,
}

impl InFlightGuard<'_> {
    fn finish(self, outcome: InFlightResult) {
        self.tx.send_replace(Some(outcome));
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.map
            .remove_if(&self.key, |_, tx| Arc::ptr_eq(tx, &self.tx));
    }
}

impl<S: DocumentSource> DocumentCache<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            ready: DashMap::new(),
            in_flight: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of payloads held.
    pub fn cached_len(&self) -> usize {
        self.ready.len()
    }

    pub fn contains(&self, doc_type: DocumentType, cid: &Cid) -> bool {
        self.ready.contains_key(&(doc_type, cid.clone()))
    }

    /// Number of fetches currently shared between callers.
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    fn cached(&self, key: &CacheKey) -> Option<Value> {
        self.ready.get(key).map(|entry| entry.value().clone())
    }

    fn role(&self, key: &CacheKey) -> Result<Role, Value> {
        // the shard guard must drop before any await
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => Ok(Role::Waiter(entry.get().subscribe())),
            Entry::Vacant(entry) => {
                // a fetcher stores its payload before clearing its marker
                if let Some(value) = self.cached(key) {
                    return Err(value);
                }
                let (tx, _rx) = watch::channel(None);
                let tx = Arc::new(tx);
                entry.insert(Arc::clone(&tx));
                Ok(Role::Fetcher(tx))
            }
        }
    }
}

#[async_trait::async_trait]
impl<S: DocumentSource> DocumentSource for DocumentCache<S> {
    async fn fetch(&self, doc_type: DocumentType, cid: &Cid) -> Result<Value, FetchError> {
        let key = (doc_type, cid.clone());
        if let Some(value) = self.cached(&key) {
            log::trace!("cache hit: {} {}", doc_type, cid);
            return Ok(value);
        }

        let tx = match self.role(&key) {
            Err(value) => return Ok(value),
            Ok(Role::Fetcher(tx)) => tx,
            Ok(Role::Waiter(mut rx)) => {
                log::trace!("waiting on in-flight fetch: {} {}", doc_type, cid);
                let shared = rx
                    .wait_for(Option::is_some)
                    .await
                    .ok()
                    .and_then(|outcome| (*outcome).clone());
                return match shared {
                    Some(outcome) => outcome,
                    None => {
                        log::debug!("in-flight fetch for {} {} was dropped", doc_type, cid);
                        self.inner.fetch(doc_type, cid).await
                    }
                };
            }
        };

        let guard = InFlightGuard {
            key: key.clone(),
            map: &self.in_flight,
            tx,
        };
        let outcome = self.inner.fetch(doc_type, cid).await;
        if let Ok(value) = &outcome {
            self.ready.insert(key, value.clone());
        }
        guard.finish(outcome.clone());
        outcome
    }
}
