//! distcache - A distributed in-memory cache
//!
//! Runs either a cache node (`NODE_ROLE=cache`) serving one group backed by
//! a simulated database, or the master (`NODE_ROLE=master`) routing lookups
//! to the nodes listed in `PEERS`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use distcache::api::{create_master_router, create_node_router, DEFAULT_BASE_PATH};
use distcache::backend::SimulatedDb;
use distcache::{
    Config, Group, GroupOptions, GroupRegistry, MasterState, NodeRole, NodeState, Router,
};

/// Simulated per-load database latency.
const DB_LATENCY: Duration = Duration::from_millis(10);

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the node's group registry or the master's router
/// 4. Start HTTP server on configured port
/// 5. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "distcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: role={}, addr={}, group={}, capacity={}B, k={}, replicas={}",
        config.role,
        config.self_addr(),
        config.group_name,
        config.cache_capacity,
        config.lru_k,
        config.replicas
    );

    let app = match config.role {
        NodeRole::Cache => {
            let db = Arc::new(SimulatedDb::seeded(config.demo_keys, DB_LATENCY));
            let group = Group::<_, _>::new(
                config.group_name.clone(),
                Arc::clone(&db),
                db,
                GroupOptions::from(&config),
            )
            .context("invalid group options")?;

            let registry = GroupRegistry::new();
            // A duplicate name is a startup bug; abort.
            registry
                .register(group)
                .context("failed to register cache group")?;
            info!("Serving group [{}] under {}", config.group_name, DEFAULT_BASE_PATH);
            create_node_router(NodeState::new(Arc::new(registry)))
        }
        NodeRole::Master => {
            let router: Router = Router::new(config.replicas, None).context("invalid ring options")?;
            router
                .register("http://", DEFAULT_BASE_PATH, &config.peers)
                .context("failed to register cache nodes")?;
            info!("Routing over {} cache nodes", router.peer_count());
            create_master_router(MasterState::new(Arc::new(router)))
        }
    };

    let addr = config.self_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
