//! API Handlers
//!
//! HTTP request handlers for cache nodes and the master.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::group::GroupRegistry;
use crate::models::{ApiQuery, HealthResponse, PutResponse, StatsResponse};
use crate::router::Router;

/// State shared by the handlers of a cache node.
#[derive(Clone)]
pub struct NodeState {
    /// Groups served by this node
    pub registry: Arc<GroupRegistry>,
}

impl NodeState {
    pub fn new(registry: Arc<GroupRegistry>) -> Self {
        Self { registry }
    }
}

/// State shared by the handlers of the master.
#[derive(Clone)]
pub struct MasterState {
    pub router: Arc<Router>,
}

impl MasterState {
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }
}

/// Handler for GET {base}/:group/*key
///
/// Returns the raw value, loading it into the group on a miss.
pub async fn get_value_handler(
    State(state): State<NodeState>,
    Path((group, key)): Path<(String, String)>,
) -> Result<Bytes> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("key cannot be empty".to_string()));
    }
    let service = state.registry.get(&group)?;
    debug!(group = %group, key = %key, "peer get");
    service.get(&key).await
}

/// Handler for PUT {base}/:group/*key
///
/// Writes the raw request body through to the group's backing store.
pub async fn put_value_handler(
    State(state): State<NodeState>,
    Path((group, key)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<PutResponse>> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("key cannot be empty".to_string()));
    }
    let service = state.registry.get(&group)?;
    let size = body.len();
    service.put(&key, body.to_vec()).await?;

    Ok(Json(PutResponse::new(group, key, size)))
}

/// Handler for GET /stats
///
/// Returns cache statistics of every group on this node.
pub async fn stats_handler(State(state): State<NodeState>) -> Json<Vec<StatsResponse>> {
    let stats = state
        .registry
        .names()
        .into_iter()
        .filter_map(|name| {
            let service = state.registry.get(&name).ok()?;
            Some(StatsResponse::new(name, &service.stats()))
        })
        .collect();
    Json(stats)
}

/// Handler for GET /api?name=..&key=..
///
/// Routes the lookup to the cache node owning the key. A malformed query
/// string is answered with the usual JSON error body.
pub async fn api_handler(
    State(state): State<MasterState>,
    query: std::result::Result<Query<ApiQuery>, QueryRejection>,
) -> Result<Bytes> {
    let Query(query) =
        query.map_err(|rejection| CacheError::InvalidRequest(rejection.body_text()))?;
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }
    state.router.get(&query.name, &query.key).await
}

/// Handler for GET /health on a cache node
pub async fn node_health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy("cache"))
}

/// Handler for GET /health on the master
pub async fn master_health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy("master"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SimulatedDb;
    use crate::group::{Group, GroupOptions};
    use std::time::Duration;

    fn node_state() -> NodeState {
        let registry = GroupRegistry::new();
        let db = Arc::new(SimulatedDb::seeded(10, Duration::ZERO));
        registry
            .register(Group::<_, _>::new("scores", Arc::clone(&db), db, GroupOptions::default()).unwrap())
            .unwrap();
        NodeState::new(Arc::new(registry))
    }

    fn path(group: &str, key: &str) -> Path<(String, String)> {
        Path((group.to_string(), key.to_string()))
    }

    #[tokio::test]
    async fn test_get_value_handler() {
        let state = node_state();
        let value = get_value_handler(State(state), path("scores", "4"))
            .await
            .unwrap();
        assert_eq!(&value[..], b"5");
    }

    #[tokio::test]
    async fn test_get_value_unknown_group() {
        let state = node_state();
        let result = get_value_handler(State(state), path("nope", "4")).await;
        assert_eq!(result.unwrap_err(), CacheError::NoSuchGroup("nope".to_string()));
    }

    #[tokio::test]
    async fn test_put_then_get_handler() {
        let state = node_state();

        let response = put_value_handler(
            State(state.clone()),
            path("scores", "fresh"),
            Bytes::from_static(b"hello"),
        )
        .await
        .unwrap();
        assert_eq!(response.bytes, 5);

        let value = get_value_handler(State(state), path("scores", "fresh"))
            .await
            .unwrap();
        assert_eq!(&value[..], b"hello");
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = node_state();
        get_value_handler(State(state.clone()), path("scores", "1"))
            .await
            .unwrap();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.len(), 1);
        assert_eq!(response[0].group, "scores");
        assert_eq!(response[0].misses, 1);
        assert_eq!(response[0].entries, 1);
    }

    #[tokio::test]
    async fn test_api_handler_rejects_empty_key() {
        let router = Router::new(3, None).unwrap();
        let state = MasterState::new(Arc::new(router));
        let query = ApiQuery {
            name: "scores".to_string(),
            key: String::new(),
        };

        let result = api_handler(State(state), Ok(Query(query))).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_api_handler_malformed_query_is_invalid_request() {
        let state = MasterState::new(Arc::new(Router::new(3, None).unwrap()));
        let uri: axum::http::Uri = "/api?name=scores".parse().unwrap();
        let query = Query::<ApiQuery>::try_from_uri(&uri);
        assert!(query.is_err());

        match api_handler(State(state), query).await {
            Err(CacheError::InvalidRequest(msg)) => assert!(msg.contains("key"), "{msg}"),
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_api_handler_without_nodes() {
        let state = MasterState::new(Arc::new(Router::new(3, None).unwrap()));
        let query = ApiQuery {
            name: "scores".to_string(),
            key: "1".to_string(),
        };

        let result = api_handler(State(state), Ok(Query(query))).await;
        assert_eq!(result.unwrap_err(), CacheError::NoNodesRegistered);
    }

    #[tokio::test]
    async fn test_health_handlers() {
        assert_eq!(node_health_handler().await.status, "healthy");
        assert_eq!(master_health_handler().await.role, "master");
    }
}
