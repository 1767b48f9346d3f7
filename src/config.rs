//! Configuration Module
//!
//! Handles loading node and master configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::CacheError;

/// Which half of the cluster this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Serves one cache group to peers
    Cache,
    /// Routes lookups to cache nodes over the hash ring
    Master,
}

impl FromStr for NodeRole {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cache" | "node" => Ok(Self::Cache),
            "master" | "router" => Ok(Self::Master),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown node role [{other}], expected cache or master"
            ))),
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Master => write!(f, "master"),
        }
    }
}

/// Process configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub role: NodeRole,
    /// Host the server binds to; peers reach the node under the same name
    pub host: String,
    /// HTTP server port
    pub server_port: u16,
    /// `host:port` of every cache node the master routes to
    pub peers: Vec<String>,
    /// Name of the group a cache node serves
    pub group_name: String,
    /// Byte capacity of the group's LRU-K cache
    pub cache_capacity: u64,
    /// Promotion threshold K
    pub lru_k: usize,
    /// Virtual nodes per cache node on the hash ring
    pub replicas: usize,
    /// How long a request waits for a coalesced load, in milliseconds
    pub load_timeout_ms: u64,
    /// Rows seeded into the simulated backing store
    pub demo_keys: usize,
}

fn parse_env<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_peers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `NODE_ROLE` - `cache` or `master` (default: cache)
    /// - `NODE_HOST` - Host name (default: localhost)
    /// - `SERVER_PORT` - HTTP server port (default: 8001)
    /// - `PEERS` - Comma separated cache node addresses (default: localhost:8001..8004)
    /// - `GROUP_NAME` - Served group (default: test)
    /// - `CACHE_CAPACITY` - Cache capacity in bytes (default: 2048)
    /// - `LRU_K` - Promotion threshold (default: 2)
    /// - `REPLICAS` - Virtual nodes per cache node (default: 3)
    /// - `LOAD_TIMEOUT_MS` - Per-request load timeout (default: 3000)
    /// - `DEMO_KEYS` - Simulated store size (default: 100)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            role: parse_env("NODE_ROLE", defaults.role),
            host: env::var("NODE_HOST").unwrap_or(defaults.host),
            server_port: parse_env("SERVER_PORT", defaults.server_port),
            peers: env::var("PEERS")
                .map(|raw| parse_peers(&raw))
                .unwrap_or(defaults.peers),
            group_name: env::var("GROUP_NAME").unwrap_or(defaults.group_name),
            cache_capacity: parse_env("CACHE_CAPACITY", defaults.cache_capacity),
            lru_k: parse_env("LRU_K", defaults.lru_k),
            replicas: parse_env("REPLICAS", defaults.replicas),
            load_timeout_ms: parse_env("LOAD_TIMEOUT_MS", defaults.load_timeout_ms),
            demo_keys: parse_env("DEMO_KEYS", defaults.demo_keys),
        }
    }

    /// Address the server binds to and peers use to reach this node.
    pub fn self_addr(&self) -> String {
        format!("{}:{}", self.host, self.server_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            role: NodeRole::Cache,
            host: "localhost".to_string(),
            server_port: 8001,
            peers: (8001..=8004).map(|port| format!("localhost:{port}")).collect(),
            group_name: "test".to_string(),
            cache_capacity: 2048,
            lru_k: 2,
            replicas: 3,
            load_timeout_ms: 3000,
            demo_keys: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.role, NodeRole::Cache);
        assert_eq!(config.server_port, 8001);
        assert_eq!(config.peers.len(), 4);
        assert_eq!(config.peers[3], "localhost:8004");
        assert_eq!(config.group_name, "test");
        assert_eq!(config.cache_capacity, 2048);
        assert_eq!(config.lru_k, 2);
        assert_eq!(config.replicas, 3);
        assert_eq!(config.self_addr(), "localhost:8001");
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in ["NODE_ROLE", "SERVER_PORT", "PEERS", "CACHE_CAPACITY", "LRU_K"] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.role, NodeRole::Cache);
        assert_eq!(config.server_port, 8001);
        assert_eq!(config.cache_capacity, 2048);
        assert_eq!(config.lru_k, 2);
        assert_eq!(config.peers.len(), 4);
    }

    #[tokio::test]
    async fn test_self_addr_is_bindable_on_configured_host() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            server_port: 0,
            ..Config::default()
        };
        assert_eq!(config.self_addr(), "127.0.0.1:0");

        let listener = tokio::net::TcpListener::bind(config.self_addr())
            .await
            .unwrap();
        let bound = listener.local_addr().unwrap();
        assert!(bound.ip().is_loopback());
        assert_ne!(bound.port(), 0);
    }

    #[test]
    fn test_node_role_parse() {
        assert_eq!("master".parse::<NodeRole>().unwrap(), NodeRole::Master);
        assert_eq!(" Cache ".parse::<NodeRole>().unwrap(), NodeRole::Cache);
        assert!("leader".parse::<NodeRole>().is_err());
        assert_eq!(NodeRole::Master.to_string(), "master");
    }

    #[test]
    fn test_parse_peers_skips_blanks() {
        assert_eq!(
            parse_peers("a:1, b:2,,c:3 "),
            vec!["a:1".to_string(), "b:2".to_string(), "c:3".to_string()]
        );
    }
}
