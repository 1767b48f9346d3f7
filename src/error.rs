//! Error types for the distributed cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for caches, the hash ring, groups and the router.
///
/// The type is `Clone` so a single coalesced load outcome can be delivered
/// to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A single entry is bigger than the whole cache
    #[error("entry of {size} bytes exceeds cache capacity of {capacity} bytes")]
    EntryTooLarge { size: u64, capacity: u64 },

    /// Key absent from the cache or from the backing store
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Node is already a member of the hash ring
    #[error("peer was already registered: {0}")]
    AlreadyRegistered(String),

    /// Node was never a member of the hash ring
    #[error("peer is not registered: {0}")]
    NotRegistered(String),

    /// Routing attempted with an empty ring
    #[error("no peer was registered")]
    NoNodesRegistered,

    /// A waiter gave up on an in-flight load
    #[error("timed out waiting for key: {0}")]
    Timeout(String),

    /// A group with this name already exists
    #[error("group already exists: {0}")]
    DuplicateGroupName(String),

    /// No group with this name exists
    #[error("no such service: {0}")]
    NoSuchGroup(String),

    /// Non-positive capacity, K or similar construction parameter
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed request parameters
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Peer request failed (network or non-success status)
    #[error("peer request failed: {0}")]
    Transport(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::KeyNotFound(_) | CacheError::NoSuchGroup(_) => StatusCode::NOT_FOUND,
            CacheError::EntryTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            CacheError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CacheError::Transport(_) => StatusCode::BAD_GATEWAY,
            CacheError::InvalidConfig(_) | CacheError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::AlreadyRegistered(_)
            | CacheError::NotRegistered(_)
            | CacheError::DuplicateGroupName(_) => StatusCode::CONFLICT,
            CacheError::NoNodesRegistered => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the distributed cache.
pub type Result<T> = std::result::Result<T, CacheError>;
