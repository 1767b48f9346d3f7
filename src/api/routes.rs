//! API Routes
//!
//! Configures the Axum routers for cache nodes and the master.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    api_handler, get_value_handler, master_health_handler, node_health_handler,
    put_value_handler, stats_handler, MasterState, NodeState,
};

/// Path prefix under which a node serves its groups to peers.
pub const DEFAULT_BASE_PATH: &str = "/_cache/";

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Creates the router of a cache node.
///
/// # Endpoints
/// - `GET /_cache/:group/*key` - Value of a key, loaded on a miss
/// - `PUT /_cache/:group/*key` - Write-through store of the raw body
/// - `GET /stats` - Per-group cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_node_router(state: NodeState) -> Router {
    let value_path = format!("{DEFAULT_BASE_PATH}:group/*key");

    Router::new()
        .route(&value_path, get(get_value_handler).put(put_value_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(node_health_handler))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Creates the router of the master.
///
/// # Endpoints
/// - `GET /api?name=<group>&key=<key>` - Lookup routed to the owning node
/// - `GET /health` - Health check endpoint
pub fn create_master_router(state: MasterState) -> Router {
    Router::new()
        .route("/api", get(api_handler))
        .route("/health", get(master_health_handler))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
