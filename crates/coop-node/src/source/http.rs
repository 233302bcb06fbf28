use async_trait::async_trait;
use bytes::Bytes;
use coop_cache::ContentKey;
use hyper::{body, client::HttpConnector, Body, Client, StatusCode, Uri};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::source::{ContentSource, Lookup, SourceError};

pub type HttpClient = Client<HttpConnector, Body>;

/// How far a node goes to answer `GET /file/:key`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Local cache, then siblings, then origin.
    #[default]
    Full,
    /// Local cache only. Siblings ask each other with this scope so a miss
    /// never bounces back through the asking node.
    Local,
}

/// Another coop node (or an HTTP origin) reached over `GET {base}/file/{key}`.
#[derive(Clone)]
pub struct HttpSource {
    name: String,
    base: String,
    scope: Scope,
    client: HttpClient,
}

impl HttpSource {
    pub fn new(name: impl Into<String>, base: impl Into<String>, scope: Scope) -> Self {
        Self::with_client(name, base, scope, Client::new())
    }

    /// Sources of one node share a connection pool.
    pub fn with_client(
        name: impl Into<String>,
        base: impl Into<String>,
        scope: Scope,
        client: HttpClient,
    ) -> Self {
        Self {
            name: name.into(),
            base: base.into().trim_end_matches('/').to_string(),
            scope,
            client,
        }
    }

    pub fn sibling(name: impl Into<String>, base: impl Into<String>, client: HttpClient) -> Self {
        Self::with_client(name, base, Scope::Local, client)
    }

    pub fn endpoint(&self, key: &ContentKey) -> String {
        match self.scope {
            Scope::Full => format!("{}/file/{key}", self.base),
            Scope::Local => format!("{}/file/{key}?scope=local", self.base),
        }
    }

    async fn get(&self, key: &ContentKey) -> Result<Option<Bytes>, SourceError> {
        let endpoint = self.endpoint(key);
        let uri = endpoint
            .parse::<Uri>()
            .map_err(|_| SourceError::InvalidUri(endpoint.clone()))?;
        debug!("Sending request to {endpoint}");
        let resp = self.client.get(uri).await?;
        match resp.status() {
            StatusCode::OK => Ok(Some(body::to_bytes(resp.into_body()).await?)),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(SourceError::Status(status)),
        }
    }
}

#[async_trait]
impl ContentSource for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, key: &ContentKey) -> Lookup {
        match self.get(key).await {
            Ok(Some(payload)) => Lookup::Found(payload),
            Ok(None) => Lookup::Absent,
            Err(e) => Lookup::Failed(e),
        }
    }
}
