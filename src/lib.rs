//! distcache - A distributed in-memory cache
//!
//! Cache nodes serve named groups backed by a two-tier LRU-K cache with
//! request coalescing on misses. A master routes lookups to nodes over a
//! consistent hash ring.

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod group;
pub mod hashring;
pub mod models;
pub mod peer;
pub mod router;

pub use api::{MasterState, NodeState};
pub use config::{Config, NodeRole};
pub use error::{CacheError, Result};
pub use group::{Group, GroupOptions, GroupRegistry, Service};
pub use hashring::HashRing;
pub use peer::{HttpPeer, PeerGetter};
pub use router::Router;
