//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check byte accounting and tier placement over random
//! operation sequences.

use proptest::prelude::*;
use std::collections::HashMap;

use crate::cache::{entry_size, ByteView, Lru, LruKCache, Tier};
use crate::error::CacheError;

// == Strategies ==
/// Small key space so sequences revisit keys often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-h]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{0,12}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: String },
    Get { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // current_bytes never exceeds capacity and always equals the sum of the
    // resident entry sizes.
    #[test]
    fn prop_lru_byte_accounting(
        max_bytes in 4u64..64,
        ops in prop::collection::vec(cache_op_strategy(), 1..120)
    ) {
        let mut lru = Lru::new(max_bytes).unwrap();

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    let value = ByteView::from(value.as_str());
                    let size = entry_size(&key, &value);
                    match lru.put(key, value) {
                        Ok(_) => prop_assert!(size <= max_bytes),
                        Err(CacheError::EntryTooLarge { .. }) => prop_assert!(size > max_bytes),
                        Err(other) => prop_assert!(false, "unexpected error {other}"),
                    }
                }
                CacheOp::Get { key } => {
                    let _ = lru.get(&key);
                }
            }
            prop_assert!(lru.current_bytes() <= max_bytes);
            prop_assert_eq!(lru.current_bytes(), lru.resident_bytes());
            prop_assert_eq!(lru.keys().len(), lru.len());
        }
    }

    // The last successful write of a resident key is what get returns.
    #[test]
    fn prop_lru_returns_latest_write(
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let mut lru = Lru::new(1024).unwrap();
        let mut model: HashMap<String, String> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    lru.put(key.clone(), ByteView::from(value.as_str())).unwrap();
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    let got = lru.get(&key).map(|v| v.to_string());
                    prop_assert_eq!(got, model.get(&key).cloned());
                }
            }
        }
    }

    // Every counted key sits in exactly one tier matching its count, and the
    // aggregate bytes equal the two tiers combined.
    #[test]
    fn prop_lru_k_tier_invariants(
        max_bytes in 8u64..64,
        k in 1usize..4,
        ops in prop::collection::vec(cache_op_strategy(), 1..150)
    ) {
        let cache = LruKCache::<ByteView>::new(max_bytes, k).unwrap();

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    let _ = cache.put(key, ByteView::from(value.as_str()));
                }
                CacheOp::Get { key } => {
                    let _ = cache.get(&key);
                }
            }
            cache.assert_invariants();
        }
    }

    // While the probationary tier is non-empty, a new insert never removes a
    // protected key.
    #[test]
    fn prop_lru_k_protected_survives_scans(
        scan in prop::collection::vec(value_strategy(), 1..60)
    ) {
        let cache = LruKCache::<ByteView>::new(40, 2).unwrap();
        cache.put("hot", ByteView::from("1")).unwrap();
        cache.get("hot").unwrap();
        cache.get("hot").unwrap();
        prop_assert_eq!(cache.tier_of("hot"), Some(Tier::Protected));

        for (i, value) in scan.into_iter().enumerate() {
            // 3-char key + up to 12 bytes always fits next to "hot"
            cache.put(format!("s{i:02}"), ByteView::from(value.as_str())).unwrap();
            prop_assert_eq!(cache.tier_of("hot"), Some(Tier::Protected));
        }
    }
}
