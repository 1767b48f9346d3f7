//! Peer Transport Module
//!
//! Client side of node-to-node lookups. A peer is addressed by a base URL of
//! the form `prefix + host:port + suffix`; a lookup appends `group/key`,
//! each percent-encoded as a single path segment.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::error::{CacheError, Result};

/// Upper bound on one remote lookup, connect included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// == Peer Getter ==
/// Fetches values held by a remote cache node.
#[async_trait]
pub trait PeerGetter: Send + Sync + 'static {
    /// Creates a handle for the node reachable at `base_url`.
    fn connect(base_url: String) -> Result<Self>
    where
        Self: Sized;

    fn base_url(&self) -> &str;

    /// Raw bytes of `key` in the remote group `group`.
    async fn fetch(&self, group: &str, key: &str) -> Result<Bytes>;
}

// == HTTP Peer ==
#[derive(Debug, Clone)]
pub struct HttpPeer {
    client: Client,
    base_url: String,
}

impl HttpPeer {
    /// Lookup URL of `key` in `group`. Reserved characters such as `/`, `?`,
    /// `#` and `%` are escaped so the node sees the key unchanged.
    pub fn url_for(&self, group: &str, key: &str) -> Result<Url> {
        let bad_base = |reason: String| {
            CacheError::Transport(format!("bad peer url {}: {reason}", self.base_url))
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| bad_base(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| bad_base("cannot hold a path".to_string()))?
            .pop_if_empty()
            .push(group)
            .push(key);
        Ok(url)
    }
}

#[async_trait]
impl PeerGetter for HttpPeer {
    fn connect(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CacheError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch(&self, group: &str, key: &str) -> Result<Bytes> {
        let url = self.url_for(group, key)?;
        debug!(%url, "peer lookup");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| CacheError::Transport(format!("request to {url} failed: {e}")))?;

        // Anything but 200 is opaque to the caller.
        if response.status() != StatusCode::OK {
            return Err(CacheError::Transport(format!(
                "{url} answered {}",
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| CacheError::Transport(format!("reading body from {url} failed: {e}")))
    }
}
