//! Index loading from a local file or an HTTP(S) endpoint.
//!
//! Defines the [`IndexSource`] trait so the viewer can read `index.json` from
//! disk during development or from the static host that serves the scrape.

use crate::schema::{IndexDocument, NodeMap};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to fetch index from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Index request to {url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to read index file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed index JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Async trait implemented by each index location.
#[async_trait::async_trait]
pub trait IndexSource: Send + Sync {
    fn describe(&self) -> String;
    async fn read(&self) -> Result<String, LoadError>;
}

/// `index.json` on the local filesystem.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl IndexSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn read(&self) -> Result<String, LoadError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| LoadError::Read {
                path: self.path.clone(),
                source,
            })
    }
}

/// `index.json` served over HTTP(S).
pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait::async_trait]
impl IndexSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn read(&self) -> Result<String, LoadError> {
        let fetch_err = |source: reqwest::Error| LoadError::Fetch {
            url: self.url.clone(),
            source,
        };

        let response = self.client.get(&self.url).send().await.map_err(fetch_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: self.url.clone(),
                status,
            });
        }

        response.text().await.map_err(fetch_err)
    }
}

/// Pick a source for a location string: `http(s)://` URLs go over the network,
/// anything else is treated as a file path.
pub fn source_for(location: &str, client: reqwest::Client) -> Box<dyn IndexSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpSource::new(client, location))
    } else {
        Box::new(FileSource::new(location))
    }
}

/// Read the index once and build the node map.
pub async fn load(source: &dyn IndexSource) -> Result<NodeMap, LoadError> {
    debug!("Loading index from {}", source.describe());
    let body = source.read().await?;
    let nodes = parse_index(&body)?;
    info!("Loaded {} nodes from {}", nodes.len(), source.describe());
    Ok(nodes)
}

/// Parse an index payload; a missing `nodes` field yields an empty map.
pub fn parse_index(body: &str) -> Result<NodeMap, LoadError> {
    let document: IndexDocument = serde_json::from_str(body)?;
    Ok(document.nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use std::io::Write;

    #[test]
    fn test_parse_without_nodes_is_empty() {
        let nodes = parse_index(r#"{"start_urls": []}"#).unwrap();
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_parse_malformed() {
        let err = parse_index("{\"nodes\": {").unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
        assert!(err.to_string().starts_with("Malformed index JSON"));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"nodes": {{"http://h/a": {{"title": "A", "children": ["http://h/b"]}}, "http://h/b": {{}}}}}}"#
        )
        .unwrap();

        let source = FileSource::new(file.path());
        let nodes = load(&source).await.unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes["http://h/a"].children, vec!["http://h/b".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("index.json"));
        let err = load(&source).await.unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }

    #[tokio::test]
    async fn test_http_source() {
        let app = Router::new()
            .route("/index.json", get(|| async { r#"{"nodes": {"u": {"title": "T"}}}"# }))
            .route("/gone.json", get(|| async { StatusCode::NOT_FOUND }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::new();

        let ok = source_for(&format!("http://{}/index.json", addr), client.clone());
        let nodes = load(ok.as_ref()).await.unwrap();
        assert_eq!(nodes["u"].title.as_deref(), Some("T"));

        let gone = source_for(&format!("http://{}/gone.json", addr), client);
        let err = load(gone.as_ref()).await.unwrap_err();
        assert!(matches!(
            err,
            LoadError::Status { status, .. } if status == reqwest::StatusCode::NOT_FOUND
        ));
    }
}
