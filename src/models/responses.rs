//! Response DTOs for the cache node and master APIs
//!
//! Defines the structure of outgoing JSON response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for a write-through store (PUT {base}/:group/*key)
#[derive(Debug, Clone, Serialize)]
pub struct PutResponse {
    /// Group the key was stored in
    pub group: String,
    /// The key that was stored
    pub key: String,
    /// Size of the stored value in bytes
    pub bytes: usize,
}

impl PutResponse {
    pub fn new(group: impl Into<String>, key: impl Into<String>, bytes: usize) -> Self {
        Self {
            group: group.into(),
            key: key.into(),
            bytes,
        }
    }
}

/// One group's entry in the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub group: String,
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Keys currently cached
    pub entries: usize,
    pub max_bytes: u64,
    pub current_bytes: u64,
    pub probation_bytes: u64,
    pub protected_bytes: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a group's cache statistics
    pub fn new(group: impl Into<String>, stats: &CacheStats) -> Self {
        Self {
            group: group.into(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            entries: stats.entries,
            max_bytes: stats.max_bytes,
            current_bytes: stats.current_bytes,
            probation_bytes: stats.probation_bytes,
            protected_bytes: stats.protected_bytes,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// `cache` or `master`
    pub role: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(role: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            role: role.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
