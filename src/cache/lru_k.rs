//! LRU-K Cache Module
//!
//! Two-tier cache: new keys enter a probationary LRU and move to a protected
//! LRU once they have been referenced `K + 1` times. Eviction always drains
//! the probationary tier before touching the protected one, so one-off scans
//! cannot push out hot keys.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::list::Entry;
use crate::cache::lru::{entry_size, Lru};
use crate::cache::{CacheStats, Value};
use crate::error::{CacheError, Result};

// == Tier ==
/// Sub-cache currently holding a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Probation,
    Protected,
}

#[derive(Debug)]
struct LruKState<V> {
    probation: Lru<V>,
    protected: Lru<V>,
    /// Invariant: a counted key lives in exactly one tier.
    access_count: HashMap<String, usize>,
    current_bytes: u64,
    stats: CacheStats,
}

impl<V: Value> LruKState<V> {
    fn tier_mut(&mut self, tier: Tier) -> &mut Lru<V> {
        match tier {
            Tier::Probation => &mut self.probation,
            Tier::Protected => &mut self.protected,
        }
    }

    /// Drops the bookkeeping of entries a tier evicted on its own.
    fn forget(&mut self, evicted: Vec<Entry<V>>) {
        for entry in evicted {
            self.access_count.remove(&entry.key);
            self.current_bytes -= entry_size(&entry.key, &entry.value);
            self.stats.record_eviction();
        }
    }
}

// == LRU-K Cache ==
/// Thread-safe LRU-K cache bounded by the total bytes of both tiers.
///
/// A single lock covers both tiers and the count table so promotions and
/// evictions are atomic for concurrent callers.
#[derive(Debug)]
pub struct LruKCache<V> {
    max_bytes: u64,
    k: usize,
    state: Mutex<LruKState<V>>,
}

impl<V: Value> LruKCache<V> {
    // == Constructor ==
    /// Creates a cache of `max_bytes` promoting keys on their `k + 1`-th access.
    pub fn new(max_bytes: u64, k: usize) -> Result<Self> {
        if max_bytes == 0 || k == 0 {
            return Err(CacheError::InvalidConfig(format!(
                "cache max bytes and threshold k must be positive, got max bytes [{max_bytes}] k [{k}]"
            )));
        }
        Ok(Self {
            max_bytes,
            k,
            state: Mutex::new(LruKState {
                probation: Lru::new(max_bytes)?,
                protected: Lru::new(max_bytes)?,
                access_count: HashMap::new(),
                current_bytes: 0,
                stats: CacheStats::new(),
            }),
        })
    }

    fn threshold(&self) -> usize {
        self.k + 1
    }

    fn tier_for(&self, count: usize) -> Tier {
        if count < self.threshold() {
            Tier::Probation
        } else {
            Tier::Protected
        }
    }

    // == Get ==
    /// Returns the value for `key`, counting the access and promoting the key
    /// when the count reaches `K + 1`.
    pub fn get(&self, key: &str) -> Result<V> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let count = match state.access_count.get(key).copied() {
            Some(count) => count,
            None => {
                state.stats.record_miss();
                return Err(CacheError::KeyNotFound(key.to_string()));
            }
        };

        let value = state
            .tier_mut(self.tier_for(count))
            .get(key)
            .cloned()
            .ok_or_else(|| CacheError::Internal(format!("counted key [{key}] missing from tier")))?;

        self.record_access(state, key)?;
        state.stats.record_hit();
        Ok(value)
    }

    // == Put ==
    /// Inserts or replaces a value.
    ///
    /// New keys enter the probationary tier with an access count of 1.
    /// Existing keys are updated in place and their count is bumped.
    pub fn put(&self, key: impl Into<String>, value: V) -> Result<()> {
        let key = key.into();
        let size = entry_size(&key, &value);
        if size > self.max_bytes {
            return Err(CacheError::EntryTooLarge {
                size,
                capacity: self.max_bytes,
            });
        }

        let mut guard = self.state.lock();
        let state = &mut *guard;

        let tier = match state.access_count.get(&key).copied() {
            Some(count) => {
                let tier = self.tier_for(count);
                // Take the old entry out so eviction below never picks it.
                let old = state.tier_mut(tier).remove(&key).ok_or_else(|| {
                    CacheError::Internal(format!("counted key [{key}] missing from tier"))
                })?;
                state.current_bytes -= entry_size(&key, &old);
                tier
            }
            None => Tier::Probation,
        };

        self.make_room(state, size);
        let evicted = state.tier_mut(tier).put(key.clone(), value)?;
        state.forget(evicted);
        state.current_bytes += size;

        self.record_access(state, &key)
    }

    /// Bumps the access count and promotes on reaching the threshold.
    fn record_access(&self, state: &mut LruKState<V>, key: &str) -> Result<()> {
        let count = state.access_count.entry(key.to_string()).or_insert(0);
        *count += 1;
        if *count != self.threshold() {
            return Ok(());
        }

        let value = state.probation.remove(key).ok_or_else(|| {
            CacheError::Internal(format!("promoted key [{key}] missing from probation"))
        })?;
        let evicted = state.protected.put(key.to_string(), value)?;
        state.forget(evicted);
        debug!(key, "promoted to protected tier");
        Ok(())
    }

    fn make_room(&self, state: &mut LruKState<V>, size: u64) {
        while state.current_bytes + size > self.max_bytes {
            if !self.evict_victim(state) {
                break;
            }
        }
    }

    /// Evicts the probationary LRU entry, or the protected one when the
    /// probationary tier is empty.
    fn evict_victim(&self, state: &mut LruKState<V>) -> bool {
        let tier = if !state.probation.is_empty() {
            Tier::Probation
        } else {
            Tier::Protected
        };
        match state.tier_mut(tier).evict_one() {
            Some(entry) => {
                debug!(key = %entry.key, ?tier, "evicted");
                state.forget(vec![entry]);
                true
            }
            None => false,
        }
    }

    // == Accessors ==
    pub fn current_bytes(&self) -> u64 {
        self.state.lock().current_bytes
    }

    pub fn probation_bytes(&self) -> u64 {
        self.state.lock().probation.current_bytes()
    }

    pub fn protected_bytes(&self) -> u64 {
        self.state.lock().protected.current_bytes()
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of keys in the access-count table.
    pub fn len(&self) -> usize {
        self.state.lock().access_count.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().access_count.is_empty()
    }

    pub fn access_count(&self, key: &str) -> Option<usize> {
        self.state.lock().access_count.get(key).copied()
    }

    pub fn tier_of(&self, key: &str) -> Option<Tier> {
        let state = self.state.lock();
        if state.probation.contains(key) {
            Some(Tier::Probation)
        } else if state.protected.contains(key) {
            Some(Tier::Protected)
        } else {
            None
        }
    }

    /// Key the next eviction would remove.
    pub fn victim(&self) -> Option<String> {
        let state = self.state.lock();
        state
            .probation
            .victim()
            .or_else(|| state.protected.victim())
            .map(str::to_string)
    }

    /// Keys of one tier from most to least recently used.
    pub fn tier_keys(&self, tier: Tier) -> Vec<String> {
        let state = self.state.lock();
        match tier {
            Tier::Probation => state.probation.keys(),
            Tier::Protected => state.protected.keys(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            entries: state.access_count.len(),
            max_bytes: self.max_bytes(),
            current_bytes: state.current_bytes,
            probation_bytes: state.probation.current_bytes(),
            protected_bytes: state.protected.current_bytes(),
            ..state.stats.clone()
        }
    }

    /// Panics if the tier/count/byte invariants do not hold.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let state = self.state.lock();
        assert_eq!(
            state.current_bytes,
            state.probation.current_bytes() + state.protected.current_bytes()
        );
        assert_eq!(
            state.probation.current_bytes(),
            state.probation.resident_bytes()
        );
        assert_eq!(
            state.protected.current_bytes(),
            state.protected.resident_bytes()
        );
        assert!(state.current_bytes <= self.max_bytes);
        assert_eq!(
            state.access_count.len(),
            state.probation.len() + state.protected.len()
        );
        for (key, &count) in &state.access_count {
            let in_probation = state.probation.contains(key);
            let in_protected = state.protected.contains(key);
            assert!(in_probation != in_protected, "key {key} must be in one tier");
            assert_eq!(in_protected, count >= self.threshold(), "key {key} count {count}");
        }
    }
}
