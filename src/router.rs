//! Router Module
//!
//! The master side of the cluster: it owns the consistent hash ring over
//! cache node addresses and forwards each lookup to the node owning the key.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{CacheError, Result};
use crate::hashring::{HashFn, HashRing};
use crate::peer::{HttpPeer, PeerGetter};

struct RouterState<P> {
    ring: HashRing,
    /// Keyed by node address, exactly the ring's members.
    peers: HashMap<String, Arc<P>>,
}

// == Router ==
pub struct Router<P = HttpPeer> {
    state: RwLock<RouterState<P>>,
}

impl<P: PeerGetter> Router<P> {
    pub fn new(replicas: usize, hash: Option<HashFn>) -> Result<Self> {
        Ok(Self {
            state: RwLock::new(RouterState {
                ring: HashRing::new(replicas, hash)?,
                peers: HashMap::new(),
            }),
        })
    }

    // == Register ==
    /// Adds cache nodes. Node `addr` is reached at `prefix + addr + suffix`.
    ///
    /// Nothing changes if any address is already registered.
    pub fn register<S: AsRef<str>>(&self, prefix: &str, suffix: &str, addrs: &[S]) -> Result<()> {
        let handles = addrs
            .iter()
            .map(|addr| {
                let addr = addr.as_ref();
                P::connect(format!("{prefix}{addr}{suffix}")).map(|peer| (addr.to_string(), Arc::new(peer)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut state = self.state.write();
        state.ring.add(addrs)?;
        for (addr, peer) in handles {
            info!(node = %addr, url = peer.base_url(), "registered cache node");
            state.peers.insert(addr, peer);
        }
        Ok(())
    }

    // == Delete ==
    /// Removes cache nodes. Nothing changes if any address is unknown.
    pub fn delete<S: AsRef<str>>(&self, addrs: &[S]) -> Result<()> {
        let mut state = self.state.write();
        state.ring.delete(addrs)?;
        for addr in addrs {
            state.peers.remove(addr.as_ref());
            info!(node = addr.as_ref(), "removed cache node");
        }
        Ok(())
    }

    // == Pick ==
    /// Peer owning `key`.
    pub fn pick(&self, key: &str) -> Result<Arc<P>> {
        let state = self.state.read();
        let addr = state.ring.search(key)?;
        state
            .peers
            .get(addr)
            .cloned()
            .ok_or_else(|| CacheError::Internal(format!("ring member [{addr}] has no peer handle")))
    }

    // == Get ==
    /// Fetches `key` of `group` from the node that owns it.
    pub async fn get(&self, group: &str, key: &str) -> Result<Bytes> {
        let peer = self.pick(key)?;
        debug!(group, key, peer = peer.base_url(), "routing lookup");
        peer.fetch(group, key).await
    }

    pub fn peer_count(&self) -> usize {
        self.state.read().ring.peer_count()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().ring.is_empty()
    }
}
