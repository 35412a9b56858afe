//! HTTP server initialization and runtime setup.
//!
//! Handles store connection, index recovery, worker spawning, and Axum server lifecycle.

use crate::application::services::{AliasService, AnalyticsService, RateLimiter};
use crate::config::Config;
use crate::domain::click_worker::run_click_worker;
use crate::domain::repositories::KvStore;
use crate::infrastructure::store::{MemoryStore, RedisStore};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Opens the configured store.
///
/// With a Redis URL the connection must succeed; without one an in-process
/// store is used.
///
/// # Errors
///
/// Returns an error if Redis is configured but unreachable.
pub async fn connect_store(redis_url: Option<&str>) -> Result<Arc<dyn KvStore>> {
    match redis_url {
        Some(url) => {
            let store = RedisStore::connect(url)
                .await
                .context("Failed to connect to the Redis store")?;
            tracing::info!("Store enabled (Redis)");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!(
                "No Redis configured. Using the in-process store: aliases and clicks are lost on restart"
            );
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Store connection (Redis or in-process fallback)
/// - Alias index recovery from durable records
/// - Background click worker
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Store connection fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let store = connect_store(config.redis_url.as_deref()).await?;
    let store_timeout = config.store_timeout();

    let alias_service = Arc::new(
        AliasService::new(store.clone(), config.base_url.clone(), store_timeout)
            .with_cache_ttl(config.cache_ttl()),
    );
    alias_service.restore_index().await;

    let analytics_service = Arc::new(AnalyticsService::new(store.clone(), store_timeout));

    let rate_limiter = Arc::new(RateLimiter::new(
        store.clone(),
        config.rate_limit_max_requests,
        config.rate_limit_window(),
        config.rate_limit_fail_open,
        store_timeout,
    ));

    let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);

    tokio::spawn(run_click_worker(
        click_rx,
        analytics_service.clone(),
        config.click_worker_concurrency,
        config.click_deadline(),
    ));
    tracing::info!("Click worker started");

    let state = AppState::new(
        alias_service,
        analytics_service,
        rate_limiter,
        store,
        click_tx,
        config.trust_proxy_headers,
    );

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
