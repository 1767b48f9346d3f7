//! Consistent Hash Ring Module
//!
//! Maps keys to node addresses through virtual replicas placed on a 32-bit
//! hash ring. The ring does no locking of its own; the router serializes
//! membership changes.

use std::collections::HashSet;

use crate::error::{CacheError, Result};

/// Hash function placing virtual nodes and keys on the ring.
pub type HashFn = fn(&[u8]) -> u32;

/// Default ring hash: CRC-32 (IEEE).
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct VirtualNode {
    hash: u32,
    node: String,
}

// == Hash Ring ==
/// Consistent hash ring with `replicas` virtual nodes per member.
///
/// Invariants: `ring` is sorted by hash and holds exactly `replicas`
/// entries for every member.
#[derive(Debug, Clone)]
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    ring: Vec<VirtualNode>,
    members: HashSet<String>,
}

impl HashRing {
    // == Constructor ==
    /// Creates an empty ring; `hash` defaults to [`crc32`].
    pub fn new(replicas: usize, hash: Option<HashFn>) -> Result<Self> {
        if replicas == 0 {
            return Err(CacheError::InvalidConfig(
                "replicas must be a positive number".to_string(),
            ));
        }
        Ok(Self {
            hash: hash.unwrap_or(crc32),
            replicas,
            ring: Vec::new(),
            members: HashSet::new(),
        })
    }

    /// Virtual node `i` of `node` is keyed by `node` followed by the decimal `i`.
    fn replica_hash(&self, node: &str, i: usize) -> u32 {
        (self.hash)(format!("{node}{i}").as_bytes())
    }

    // == Add ==
    /// Adds nodes to the ring.
    ///
    /// Fails without touching the ring if any node is already a member or
    /// appears twice in `nodes`.
    pub fn add<S: AsRef<str>>(&mut self, nodes: &[S]) -> Result<()> {
        let nodes: Vec<&str> = nodes.iter().map(|n| n.as_ref()).collect();
        let mut batch = HashSet::new();
        for &node in &nodes {
            if self.members.contains(node) || !batch.insert(node) {
                return Err(CacheError::AlreadyRegistered(node.to_string()));
            }
        }

        for node in nodes {
            for i in 1..=self.replicas {
                let hash = self.replica_hash(node, i);
                self.ring.push(VirtualNode {
                    hash,
                    node: node.to_string(),
                });
            }
            self.members.insert(node.to_string());
        }
        // Ties on hash are broken by address so placement is independent of
        // insertion order.
        self.ring
            .sort_unstable_by(|a, b| a.hash.cmp(&b.hash).then_with(|| a.node.cmp(&b.node)));
        Ok(())
    }

    // == Delete ==
    /// Removes nodes and all their virtual replicas.
    ///
    /// Fails without touching the ring if any node is not a member.
    pub fn delete<S: AsRef<str>>(&mut self, nodes: &[S]) -> Result<()> {
        let nodes: Vec<&str> = nodes.iter().map(|n| n.as_ref()).collect();
        if let Some(missing) = nodes.iter().find(|&&n| !self.members.contains(n)) {
            return Err(CacheError::NotRegistered(missing.to_string()));
        }

        for node in nodes {
            self.members.remove(node);
        }
        let members = &self.members;
        self.ring.retain(|v| members.contains(&v.node));
        Ok(())
    }

    // == Search ==
    /// Returns the node owning `key`: the first virtual node clockwise from
    /// the key's hash, wrapping to the start of the ring.
    pub fn search(&self, key: &str) -> Result<&str> {
        if self.ring.is_empty() {
            return Err(CacheError::NoNodesRegistered);
        }
        let hash = (self.hash)(key.as_bytes());
        let idx = self.ring.partition_point(|v| v.hash < hash) % self.ring.len();
        Ok(&self.ring[idx].node)
    }

    // == Accessors ==
    pub fn peer_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, node: &str) -> bool {
        self.members.contains(node)
    }

    /// Number of virtual nodes on the ring.
    pub fn len(&self) -> usize {
        self.ring.len()
    }
}
