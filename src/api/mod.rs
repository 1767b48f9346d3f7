//! API Module
//!
//! HTTP handlers and routing for cache nodes and the master.
//!
//! # Endpoints
//! Cache node:
//! - `GET /_cache/:group/*key` - Value of a key (peer lookup)
//! - `PUT /_cache/:group/*key` - Write-through store
//! - `GET /stats` - Per-group cache statistics
//! - `GET /health` - Health check endpoint
//!
//! Master:
//! - `GET /api?name=..&key=..` - Lookup routed over the hash ring
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{create_master_router, create_node_router, DEFAULT_BASE_PATH};
