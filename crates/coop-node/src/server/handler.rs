use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use coop_cache::{ContentKey, ResidentStorage};
use serde::Deserialize;
use tracing::error;

use crate::{
    node::{PeerNode, ResolveError, ServedBy},
    source::Scope,
};

pub const SERVED_BY_HEADER: &str = "x-served-by";
pub const CACHE_HEADER: &str = "x-cache";

#[derive(Debug, Default, Deserialize)]
pub struct FetchParams {
    #[serde(default)]
    pub scope: Scope,
}

pub async fn get_content<S: ResidentStorage>(
    Path(key): Path<String>,
    Query(params): Query<FetchParams>,
    Extension(node): Extension<Arc<PeerNode<S>>>,
) -> Response {
    let key = match ContentKey::new(&key) {
        Ok(key) => key,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    match params.scope {
        Scope::Full => match node.resolve(&key).await {
            Ok(resolution) => {
                let mut response = resolution.payload.into_response();
                let cache = if resolution.served_by == ServedBy::Local {
                    "HIT"
                } else {
                    "MISS"
                };
                let headers = response.headers_mut();
                headers.insert(CACHE_HEADER, HeaderValue::from_static(cache));
                if let Ok(value) = HeaderValue::from_str(&resolution.served_by.to_string()) {
                    headers.insert(SERVED_BY_HEADER, value);
                }
                response
            }
            Err(e) => handle_error(e),
        },
        Scope::Local => match node.resolve_local(&key).await {
            Ok(Some(payload)) => {
                let mut response = payload.into_response();
                let headers = response.headers_mut();
                headers.insert(CACHE_HEADER, HeaderValue::from_static("HIT"));
                headers.insert(SERVED_BY_HEADER, HeaderValue::from_static("local"));
                response
            }
            Ok(None) => handle_error(ResolveError::NotFound(key)),
            Err(e) => handle_error(e),
        },
    }
}

fn handle_error(error: ResolveError) -> Response {
    match error {
        ResolveError::NotFound(key) => {
            (StatusCode::NOT_FOUND, format!("{key} not found")).into_response()
        }
        ResolveError::Cache(e) => {
            error!("{e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
