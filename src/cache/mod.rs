//! Cache Module
//!
//! Size-bounded in-memory caches: a plain LRU and the two-tier LRU-K cache
//! that groups actually use.

pub mod list;
mod lru;
mod lru_k;
mod stats;
mod value;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use list::LinkedStore;
pub use lru::{entry_size, Lru, LruCache};
pub use lru_k::{LruKCache, Tier};
pub use stats::CacheStats;
pub use value::{ByteView, Value};
