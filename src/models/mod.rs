//! Request and Response models for the cache node and master APIs
//!
//! DTOs for the JSON side of the HTTP surface. Cached values themselves
//! travel as raw bytes and have no model.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::ApiQuery;
pub use responses::{ErrorResponse, HealthResponse, PutResponse, StatsResponse};
