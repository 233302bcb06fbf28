use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use coop_cache::{CacheSnapshot, ResidentStorage};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::node::PeerNode;

#[derive(Serialize)]
pub struct NodeStats {
    pub name: String,
    pub siblings: Vec<String>,
    #[serde(flatten)]
    pub cache: CacheSnapshot,
}

pub async fn purge_cache_handler<S: ResidentStorage>(
    Extension(node): Extension<Arc<PeerNode<S>>>,
) -> impl IntoResponse {
    match node.store().purge().await {
        Ok(purged) => (StatusCode::OK, Json(json!({ "purged": purged }))),
        Err(e) => {
            error!("Purge failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

pub async fn stats_handler<S: ResidentStorage>(
    Extension(node): Extension<Arc<PeerNode<S>>>,
) -> Json<NodeStats> {
    Json(NodeStats {
        name: node.name().to_string(),
        siblings: node.sibling_names(),
        cache: node.snapshot().await,
    })
}

pub async fn metrics_handler(
    Extension(handle): Extension<Option<Arc<PrometheusHandle>>>,
) -> (StatusCode, String) {
    match handle {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::NOT_FOUND,
            "metrics recorder not installed".to_string(),
        ),
    }
}

pub async fn get_ping_handler() -> (StatusCode, String) {
    (StatusCode::OK, "pong".to_string())
}
