//! Request DTOs for the master API
//!
//! Defines the query parameters of routed lookups.

use serde::Deserialize;

/// Query string of the master lookup (GET /api?name=..&key=..)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiQuery {
    /// Group to look the key up in
    pub name: String,
    /// The cache key
    pub key: String,
}

impl ApiQuery {
    /// Validates the query
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.name.is_empty() {
            return Some("Group name cannot be empty".to_string());
        }
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        None
    }
}
