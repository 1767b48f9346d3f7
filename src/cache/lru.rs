//! LRU Cache Module
//!
//! Size-bounded Least Recently Used cache built on the linked store.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::cache::list::{Entry, LinkedStore, NodeId};
use crate::cache::Value;
use crate::error::{CacheError, Result};

/// Bytes accounted for a key/value pair.
pub fn entry_size<V: Value>(key: &str, value: &V) -> u64 {
    (key.len() + value.byte_len()) as u64
}

// == LRU ==
/// Unsynchronized LRU core.
///
/// Recency order is list order: front = most recent, back = victim.
/// Invariant: `index` and the list hold exactly the same keys and
/// `current_bytes <= max_bytes`.
#[derive(Debug)]
pub struct Lru<V> {
    max_bytes: u64,
    current_bytes: u64,
    index: HashMap<String, NodeId>,
    list: LinkedStore<V>,
}

impl<V: Value> Lru<V> {
    // == Constructor ==
    /// Creates an LRU holding at most `max_bytes` of keys and values.
    pub fn new(max_bytes: u64) -> Result<Self> {
        if max_bytes == 0 {
            return Err(CacheError::InvalidConfig(
                "lru max bytes must be a positive number".to_string(),
            ));
        }
        Ok(Self {
            max_bytes,
            current_bytes: 0,
            index: HashMap::new(),
            list: LinkedStore::new(),
        })
    }

    // == Get ==
    /// Returns the value and marks the key as most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let id = *self.index.get(key)?;
        self.list.move_to_front(id);
        self.list.entry(id).map(|e| &e.value)
    }

    // == Put ==
    /// Inserts or replaces a value, evicting least recently used entries
    /// until it fits.
    ///
    /// Returns the evicted entries, oldest first.
    pub fn put(&mut self, key: String, value: V) -> Result<Vec<Entry<V>>> {
        let size = entry_size(&key, &value);
        if size > self.max_bytes {
            return Err(CacheError::EntryTooLarge {
                size,
                capacity: self.max_bytes,
            });
        }

        let mut evicted = Vec::new();
        if let Some(&id) = self.index.get(&key) {
            // Put the node in front first so it is the last eviction candidate.
            self.list.move_to_front(id);
            let old_size = self
                .list
                .entry(id)
                .map(|e| entry_size(&e.key, &e.value))
                .unwrap_or(0);
            while self.current_bytes - old_size + size > self.max_bytes {
                match self.evict_one() {
                    Some(entry) => evicted.push(entry),
                    None => break,
                }
            }
            if let Some(entry) = self.list.entry_mut(id) {
                entry.value = value;
            }
            self.current_bytes = self.current_bytes - old_size + size;
            return Ok(evicted);
        }

        while self.current_bytes + size > self.max_bytes {
            match self.evict_one() {
                Some(entry) => evicted.push(entry),
                None => break,
            }
        }
        let id = self.list.insert(key.clone(), value);
        self.index.insert(key, id);
        self.current_bytes += size;
        Ok(evicted)
    }

    // == Remove ==
    /// Removes a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let id = self.index.remove(key)?;
        let entry = self.list.remove(id)?;
        self.current_bytes -= entry_size(&entry.key, &entry.value);
        Some(entry.value)
    }

    // == Victim ==
    /// Key that the next eviction would remove.
    pub fn victim(&self) -> Option<&str> {
        self.list
            .victim()
            .and_then(|id| self.list.entry(id))
            .map(|e| e.key.as_str())
    }

    /// Removes the least recently used entry.
    pub fn evict_one(&mut self) -> Option<Entry<V>> {
        let id = self.list.victim()?;
        let entry = self.list.remove(id)?;
        self.index.remove(&entry.key);
        self.current_bytes -= entry_size(&entry.key, &entry.value);
        Some(entry)
    }

    // == Accessors ==
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn current_bytes(&self) -> u64 {
        self.current_bytes
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        self.list.iter().map(|e| e.key.clone()).collect()
    }

    /// Sum of entry sizes recomputed from the list.
    #[cfg(test)]
    pub(crate) fn resident_bytes(&self) -> u64 {
        self.list.iter().map(|e| entry_size(&e.key, &e.value)).sum()
    }
}

// == LRU Cache ==
/// Thread-safe LRU cache.
///
/// Every operation, including `get`, takes the exclusive lock because reads
/// update recency.
#[derive(Debug)]
pub struct LruCache<V> {
    inner: Mutex<Lru<V>>,
}

impl<V: Value> LruCache<V> {
    pub fn new(max_bytes: u64) -> Result<Self> {
        Ok(Self {
            inner: Mutex::new(Lru::new(max_bytes)?),
        })
    }

    pub fn get(&self, key: &str) -> Result<V> {
        self.inner
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| CacheError::KeyNotFound(key.to_string()))
    }

    pub fn put(&self, key: impl Into<String>, value: V) -> Result<()> {
        self.inner.lock().put(key.into(), value).map(|_| ())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn current_bytes(&self) -> u64 {
        self.inner.lock().current_bytes()
    }

    pub fn victim(&self) -> Option<String> {
        self.inner.lock().victim().map(str::to_string)
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().keys()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ByteView;

    fn kv(key: impl ToString, value: impl ToString) -> (String, ByteView) {
        (key.to_string(), ByteView::from(value.to_string().as_str()))
    }

    #[test]
    fn test_lru_rejects_zero_capacity() {
        assert!(matches!(
            Lru::<ByteView>::new(0),
            Err(CacheError::InvalidConfig(_))
        ));
        assert!(Lru::<ByteView>::new(10).is_ok());
    }

    #[test]
    fn test_lru_put_get() {
        let mut lru = Lru::new(10).unwrap();
        for i in 0..5 {
            let (k, v) = kv(i, i + 1);
            lru.put(k, v).unwrap();
        }
        assert_eq!(lru.current_bytes(), 10);

        for i in 0..5 {
            let value = lru.get(&i.to_string()).unwrap();
            assert_eq!(value.to_string(), (i + 1).to_string());
        }
    }

    #[test]
    fn test_lru_put_existing_replaces_value() {
        let mut lru = Lru::new(10).unwrap();
        lru.put("1".to_string(), ByteView::from("1")).unwrap();
        lru.put("1".to_string(), ByteView::from("2")).unwrap();

        assert_eq!(lru.get("1").unwrap().to_string(), "2");
        assert_eq!(lru.current_bytes(), 2);
        assert_eq!(lru.len(), 1);
    }

    #[test]
    fn test_lru_put_existing_with_growth_evicts_others() {
        let mut lru = Lru::new(6).unwrap();
        lru.put("a".to_string(), ByteView::from("1")).unwrap();
        lru.put("b".to_string(), ByteView::from("1")).unwrap();
        lru.put("c".to_string(), ByteView::from("1")).unwrap();

        // "a" grows from 2 to 4 bytes; "b" is the oldest other key
        let evicted = lru.put("a".to_string(), ByteView::from("123")).unwrap();
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].key, "b");
        assert_eq!(lru.keys(), vec!["a", "c"]);
        assert_eq!(lru.current_bytes(), 6);
    }

    #[test]
    fn test_lru_entry_too_large() {
        let mut lru = Lru::new(4).unwrap();
        let result = lru.put("key".to_string(), ByteView::from("xx"));
        assert_eq!(
            result.unwrap_err(),
            CacheError::EntryTooLarge {
                size: 5,
                capacity: 4
            }
        );
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_full_keeps_most_recent() {
        let mut lru = Lru::new(20).unwrap();
        for i in 0..50 {
            lru.put(format!("{i:02}"), ByteView::default()).unwrap();
        }

        assert_eq!(lru.current_bytes(), 20);
        let expected: Vec<String> = (40..50).rev().map(|i| format!("{i:02}")).collect();
        assert_eq!(lru.keys(), expected);
    }

    #[test]
    fn test_lru_victim_follows_insertion_order() {
        let (size, part) = (100u64, 4u64);
        let mut lru = Lru::new(size).unwrap();
        for i in 0..50u64 {
            let (k, v) = kv(i + 10, i + 11);
            if (i + 1) * part > size {
                let expected = (i + 10 - size / part).to_string();
                assert_eq!(lru.victim(), Some(expected.as_str()));
            }
            lru.put(k, v).unwrap();
        }
    }

    #[test]
    fn test_lru_get_refreshes_recency() {
        let mut lru = Lru::new(10).unwrap();
        let (k, v) = kv(1, 2);
        lru.put(k, v).unwrap();
        let (k, v) = kv(2, "1234567");
        lru.put(k, v).unwrap();

        lru.get("1");
        assert_eq!(lru.victim(), Some("2"));
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = Lru::new(10).unwrap();
        lru.put("a".to_string(), ByteView::from("1")).unwrap();
        assert_eq!(lru.remove("a").unwrap().to_string(), "1");
        assert_eq!(lru.current_bytes(), 0);
        assert!(lru.remove("a").is_none());
        assert!(!lru.contains("a"));
    }

    #[test]
    fn test_lru_cache_miss_is_key_not_found() {
        let cache: LruCache<ByteView> = LruCache::new(10).unwrap();
        assert_eq!(
            cache.get("nope").unwrap_err(),
            CacheError::KeyNotFound("nope".to_string())
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_cache_concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let cache = Arc::new(LruCache::<ByteView>::new(100).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..200 {
                        let key = format!("{t}-{i}");
                        cache.put(key.clone(), ByteView::from("v")).unwrap();
                        let _ = cache.get(&key);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.current_bytes() <= 100);
    }
}
