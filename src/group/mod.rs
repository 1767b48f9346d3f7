//! Named Cache Group Module
//!
//! A group ties one LRU-K cache to a loader and a write-back store under a
//! process-unique name. Misses go through request coalescing so a burst of
//! requests for one cold key costs a single load.

mod flight;
mod registry;
mod source;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::cache::{ByteView, CacheStats, LruKCache, Value};
use crate::config::Config;
use crate::error::{CacheError, Result};

pub use flight::FlightGroup;
pub use registry::GroupRegistry;
pub use source::{Loader, LoaderFn, NoWriteBack, WriteBack, WriteBackFn};

/// Cache sizing and waiting behaviour of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupOptions {
    /// Capacity of both LRU-K tiers combined, in bytes
    pub max_bytes: u64,
    /// Keys are promoted on their `k + 1`-th access
    pub k: usize,
    /// How long one caller waits for a load
    pub timeout: Duration,
}

impl Default for GroupOptions {
    fn default() -> Self {
        Self {
            max_bytes: 2048,
            k: 2,
            timeout: Duration::from_secs(3),
        }
    }
}

impl From<&Config> for GroupOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_bytes: config.cache_capacity,
            k: config.lru_k,
            timeout: Duration::from_millis(config.load_timeout_ms),
        }
    }
}

// == Service ==
/// Object-safe view of a group, as seen by the registry and the HTTP layer.
#[async_trait]
pub trait Service: Send + Sync {
    fn name(&self) -> &str;

    /// Raw bytes of `key`, loading them on a miss.
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// Write-through store of `key`.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;

    fn stats(&self) -> CacheStats;
}

// == Group ==
pub struct Group<L, W, V = ByteView> {
    name: String,
    cache: Arc<LruKCache<V>>,
    loader: Arc<L>,
    write_back: Arc<W>,
    flights: FlightGroup<V>,
    timeout: Duration,
}

impl<L: Loader, W: WriteBack, V: Value> Group<L, W, V> {
    // == Constructor ==
    /// Creates an unregistered group. Use [`GroupRegistry::register`] to make
    /// it reachable by name.
    pub fn new(
        name: impl Into<String>,
        loader: Arc<L>,
        write_back: Arc<W>,
        options: GroupOptions,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            cache: Arc::new(LruKCache::new(options.max_bytes, options.k)?),
            loader,
            write_back,
            flights: FlightGroup::new(),
            timeout: options.timeout,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cache(&self) -> &LruKCache<V> {
        &self.cache
    }

    // == Get ==
    /// Returns the cached value or loads it.
    ///
    /// Concurrent misses on one key share a single load. A caller that waits
    /// longer than the group timeout gets `CacheError::Timeout`, but the load
    /// still completes and fills the cache.
    pub async fn get(&self, key: &str) -> Result<V> {
        match self.cache.get(key) {
            Ok(value) => {
                debug!(group = %self.name, key, "cache hit");
                return Ok(value);
            }
            Err(CacheError::KeyNotFound(_)) => {}
            Err(e) => return Err(e),
        }
        debug!(group = %self.name, key, "cache miss");

        let loader = Arc::clone(&self.loader);
        let cache = Arc::clone(&self.cache);
        let (group, owned_key) = (self.name.clone(), key.to_string());
        self.flights
            .work(key, self.timeout, move || {
                load_and_populate(loader, cache, group, owned_key)
            })
            .await
    }

    // == Put ==
    /// Writes through to the backing store, then updates the cache.
    ///
    /// Nothing is cached when the write-back fails.
    pub async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.write_back.store(key, &value).await?;
        self.cache.put(key, V::from_bytes(value))?;
        debug!(group = %self.name, key, "stored");
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Miss path run once per coalesced load.
async fn load_and_populate<L: Loader, V: Value>(
    loader: Arc<L>,
    cache: Arc<LruKCache<V>>,
    group: String,
    key: String,
) -> Result<V> {
    let raw = loader.load(&key).await.map_err(|e| {
        debug!(group = %group, key = %key, error = %e, "load failed");
        e
    })?;
    let value = V::from_bytes(raw);
    // Population is best effort; the loaded value is still served.
    if let Err(e) = cache.put(key.clone(), value.clone()) {
        warn!(group = %group, key = %key, error = %e, "could not populate cache");
    }
    Ok(value)
}

#[async_trait]
impl<L: Loader, W: WriteBack, V: Value> Service for Group<L, W, V> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        let value = Group::get(self, key).await?;
        Ok(Bytes::from(value.to_bytes()))
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        Group::put(self, key, value).await
    }

    fn stats(&self) -> CacheStats {
        Group::stats(self)
    }
}
