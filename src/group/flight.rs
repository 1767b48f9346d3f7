//! Request Coalescing
//!
//! Guarantees at most one in-flight load per key. The first caller spawns
//! the load and publishes a shared handle to it; concurrent callers for the
//! same key await that handle and observe the identical outcome. Once the
//! load finishes its record is dropped, so later callers start a fresh load.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{CacheError, Result};

type SharedLoad<T> = Shared<BoxFuture<'static, Result<T>>>;
type CallMap<T> = Arc<Mutex<HashMap<String, SharedLoad<T>>>>;

/// Removes the in-flight record when the load task ends, even by panic.
struct CallGuard<T> {
    calls: CallMap<T>,
    key: String,
}

impl<T> Drop for CallGuard<T> {
    fn drop(&mut self) {
        self.calls.lock().remove(&self.key);
    }
}

// == Flight Group ==
/// Per-key deduplication of concurrent loads.
pub struct FlightGroup<T> {
    calls: CallMap<T>,
}

impl<T> Default for FlightGroup<T> {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> FlightGroup<T> {
    pub fn new() -> Self {
        Self::default()
    }

    // == Work ==
    /// Runs `load` for `key` unless a load for it is already in flight, in
    /// which case the caller waits for that one instead.
    ///
    /// `patience` bounds only this caller's wait. On timeout the caller gets
    /// `CacheError::Timeout` while the load keeps running in the background
    /// for the other waiters.
    pub async fn work<F, Fut>(&self, key: &str, patience: Duration, load: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let call = self.join_or_start(key, load);
        match tokio::time::timeout(patience, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(key, ?patience, "gave up waiting for in-flight load");
                Err(CacheError::Timeout(key.to_string()))
            }
        }
    }

    fn join_or_start<F, Fut>(&self, key: &str, load: F) -> SharedLoad<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let mut calls = self.calls.lock();
        if let Some(call) = calls.get(key) {
            debug!(key, "joining in-flight load");
            return call.clone();
        }

        let guard = CallGuard {
            calls: Arc::clone(&self.calls),
            key: key.to_string(),
        };
        let task = load();
        // The spawned task is never cancelled by a waiter giving up.
        let handle = tokio::spawn(async move {
            let _guard = guard;
            task.await
        });
        let call = handle
            .map(|joined| {
                joined.unwrap_or_else(|e| Err(CacheError::Internal(format!("load task failed: {e}"))))
            })
            .boxed()
            .shared();
        calls.insert(key.to_string(), call.clone());
        call
    }

    /// Number of keys with a load in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}
