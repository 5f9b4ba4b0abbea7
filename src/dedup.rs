//! Request Deduplication
//!
//! Tracks in-flight fetches by cache key so that concurrent callers asking
//! for the same key share one underlying network call.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{ApiError, Result};

type SharedFetch<T> = Shared<BoxFuture<'static, Result<T>>>;

struct PendingRequest<T> {
    /// Distinguishes this registration from a later one under the same key
    id: u64,
    future: SharedFetch<T>,
}

/// Single-flight tracker keyed by cache key.
///
/// The fetch runs on its own task, so it completes (and its registration is
/// removed) even if every waiter goes away. At most one registration exists
/// per key; every waiter observes the same value or the same error.
pub struct RequestDeduplicator<T = Value> {
    pending: Arc<Mutex<HashMap<String, PendingRequest<T>>>>,
    next_id: AtomicU64,
}

impl<T> RequestDeduplicator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Runs `fetch` unless a fetch for `key` is already in flight, in which
    /// case the caller joins that one instead.
    pub async fn deduplicate<F, Fut>(&self, key: &str, fetch: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.deduplicate_unless_cached(key, || async { None }, fetch)
            .await
    }

    /// Like [`deduplicate`](Self::deduplicate), but when nothing is in
    /// flight `cached` is consulted under the registration lock first.
    ///
    /// A fetch stores its result before unregistering, so a caller that
    /// missed the cache while that fetch was settling finds the value here
    /// instead of starting a second fetch.
    pub async fn deduplicate_unless_cached<C, CFut, F, Fut>(
        &self,
        key: &str,
        cached: C,
        fetch: F,
    ) -> Result<T>
    where
        C: FnOnce() -> CFut,
        CFut: Future<Output = Option<T>>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let shared = {
            let mut pending = self.pending.lock().await;

            if let Some(existing) = pending.get(key) {
                debug!("Joining in-flight request for '{}'", key);
                existing.future.clone()
            } else {
                if let Some(data) = cached().await {
                    debug!("'{}' was stored by a fetch that just settled", key);
                    return Ok(data);
                }

                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let future = self.spawn_fetch(key.to_string(), id, fetch());
                pending.insert(
                    key.to_string(),
                    PendingRequest {
                        id,
                        future: future.clone(),
                    },
                );
                future
            }
        };

        shared.await
    }

    fn spawn_fetch<Fut>(&self, key: String, id: u64, fetch: Fut) -> SharedFetch<T>
    where
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let pending = Arc::clone(&self.pending);

        let task = tokio::spawn(async move {
            let result = fetch.await;

            // Unregister on success and failure alike
            let mut pending = pending.lock().await;
            if pending.get(&key).is_some_and(|entry| entry.id == id) {
                pending.remove(&key);
            }
            result
        });

        async move {
            task.await
                .unwrap_or_else(|e| Err(ApiError::Request(format!("fetch task failed: {}", e))))
        }
        .boxed()
        .shared()
    }

    /// Number of fetches currently in flight.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Forgets every in-flight registration.
    ///
    /// Running fetches still complete for their current waiters; new callers
    /// start fresh fetches.
    pub async fn clear(&self) {
        self.pending.lock().await.clear();
    }
}

impl<T> Default for RequestDeduplicator<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
