//! Simulated Backing Store
//!
//! Stand-in for a slow database behind a cache node. It answers loads after
//! a fixed delay and counts them, which makes coalescing observable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::group::{Loader, WriteBack};

#[derive(Debug, Default)]
pub struct SimulatedDb {
    rows: RwLock<HashMap<String, Vec<u8>>>,
    latency: Duration,
    loads: AtomicUsize,
}

impl SimulatedDb {
    /// Store holding keys `"0"` to `"n-1"`, key `i` mapping to the decimal `i + 1`.
    pub fn seeded(n: usize, latency: Duration) -> Self {
        let rows = (0..n)
            .map(|i| (i.to_string(), (i + 1).to_string().into_bytes()))
            .collect();
        Self {
            rows: RwLock::new(rows),
            latency,
            loads: AtomicUsize::new(0),
        }
    }

    /// Number of loads served so far, hits and misses alike.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl Loader for SimulatedDb {
    async fn load(&self, key: &str) -> Result<Vec<u8>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let row = self.rows.read().get(key).cloned();
        debug!(key, found = row.is_some(), "db lookup");
        row.ok_or_else(|| CacheError::KeyNotFound(key.to_string()))
    }
}

#[async_trait]
impl WriteBack for SimulatedDb {
    async fn store(&self, key: &str, value: &[u8]) -> Result<()> {
        self.rows.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
