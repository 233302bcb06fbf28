pub mod admin;
pub mod handler;

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Extension, Router,
};
use coop_cache::ResidentStorage;
use coop_utils::ShutdownController;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    node::PeerNode,
    server::{
        admin::{get_ping_handler, metrics_handler, purge_cache_handler, stats_handler},
        handler::get_content,
    },
};

/// `GET /file/:key`, the only route other nodes and clients use.
pub fn content_router<S: ResidentStorage>(node: Arc<PeerNode<S>>) -> Router {
    Router::new()
        .route("/file/:key", get(get_content::<S>))
        .layer(Extension(node))
        .layer(TraceLayer::new_for_http())
}

pub fn admin_router<S: ResidentStorage>(
    node: Arc<PeerNode<S>>,
    metrics: Option<Arc<PrometheusHandle>>,
) -> Router {
    Router::new()
        .route("/purge", post(purge_cache_handler::<S>))
        .route("/stats", get(stats_handler::<S>))
        .route("/metrics", get(metrics_handler))
        .route("/ping", get(get_ping_handler))
        .layer(Extension(node))
        .layer(Extension(metrics))
}

pub struct Server<S> {
    node: Arc<PeerNode<S>>,
    addr: SocketAddr,
    admin_addr: SocketAddr,
    metrics: Option<Arc<PrometheusHandle>>,
}

impl<S: ResidentStorage> Server<S> {
    pub fn new(node: Arc<PeerNode<S>>, addr: SocketAddr, admin_addr: SocketAddr) -> Self {
        Self {
            node,
            addr,
            admin_addr,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(Arc::new(handle));
        self
    }

    /// Serves the content and admin listeners until `shutdown` fires or one of
    /// them fails.
    pub async fn start(self, shutdown: ShutdownController) -> Result<()> {
        let content = axum::Server::try_bind(&self.addr)
            .with_context(|| format!("Failed to bind {}", self.addr))?
            .serve(content_router(Arc::clone(&self.node)).into_make_service())
            .with_graceful_shutdown(shutdown.clone().wait_for_shutdown());
        info!("[{}] Listening on {}", self.node.name(), self.addr);

        let admin = axum::Server::try_bind(&self.admin_addr)
            .with_context(|| format!("Failed to bind admin {}", self.admin_addr))?
            .serve(admin_router(self.node, self.metrics).into_make_service())
            .with_graceful_shutdown(shutdown.clone().wait_for_shutdown());
        info!("Admin listening on {}", self.admin_addr);

        let result = tokio::try_join!(content, admin);
        // one listener failing takes the other one down with it
        shutdown.shutdown();
        result.context("Server error")?;
        info!("Servers stopped");
        Ok(())
    }
}
