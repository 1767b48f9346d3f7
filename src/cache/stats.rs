//! Cache Statistics Module
//!
//! Lookup counters kept under the cache lock, plus the occupancy figures a
//! snapshot adds on the way out.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of lookup counters and tier occupancy of one LRU-K cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from either tier
    pub hits: u64,
    /// Lookups of keys absent from both tiers
    pub misses: u64,
    /// Entries dropped to make room, from either tier
    pub evictions: u64,
    /// Keys in the access-count table
    pub entries: usize,
    /// Capacity shared by both tiers
    pub max_bytes: u64,
    pub current_bytes: u64,
    pub probation_bytes: u64,
    pub protected_bytes: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total lookups seen.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// hits / lookups, or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}
