//! Resource retrieval — HTTP (reqwest) or a local directory.
//!
//! Any success status counts as valid bytes; content types are not checked and
//! redirects are followed.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use audiodeck_core::types::ResourcePath;

use crate::error::FetchError;

/// Fetches one resource's raw bytes.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, path: &ResourcePath) -> Result<Vec<u8>, FetchError>;
}

pub type SharedFetcher = Arc<dyn ResourceFetcher>;

// ─── HTTP ──────────────────────────────────────────────────────────────────

/// Fetches `<base_url>/<base_dir>/<file>` over HTTP.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, path: &ResourcePath) -> String {
        format!("{}/{}", self.base_url, path.relative())
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, path: &ResourcePath) -> Result<Vec<u8>, FetchError> {
        let url = self.url_for(path);
        debug!("fetch: GET {url}");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::status(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
            ));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

// ─── Directory ─────────────────────────────────────────────────────────────

/// Reads `<root>/<base_dir>/<file>` from disk, mapping missing files to 404.
#[derive(Debug, Clone)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, path: &ResourcePath) -> PathBuf {
        self.root.join(path.relative())
    }
}

#[async_trait]
impl ResourceFetcher for DirFetcher {
    async fn fetch(&self, path: &ResourcePath) -> Result<Vec<u8>, FetchError> {
        let file = self.path_for(path);
        debug!("fetch: read {}", file.display());

        match tokio::fs::read(&file).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::not_found()),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(FetchError::status(403, "Forbidden"))
            }
            Err(e) => Err(FetchError::Io(e)),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use audiodeck_core::types::{Catalog, Identifier, ResourceKind};

    #[tokio::test]
    async fn dir_fetcher_reads_and_maps_missing_to_404() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("audio")).unwrap();
        std::fs::write(dir.path().join("audio/001.txt"), "hello").unwrap();

        let fetcher = DirFetcher::new(dir.path());
        let catalog = Catalog::default();
        let id = Identifier::ordinal(1);

        let bytes = fetcher
            .fetch(&catalog.resource(&id, ResourceKind::Text))
            .await
            .unwrap();
        assert_eq!(bytes, b"hello");

        let err = fetcher
            .fetch(&catalog.resource(&id, ResourceKind::Audio))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert_eq!(err.to_string(), "Not Found");
    }

    #[test]
    fn http_fetcher_joins_base_url() {
        let fetcher = HttpFetcher::new("http://localhost:8000/deck/");
        let path = ResourcePath::new("audio", "002.wav");
        assert_eq!(fetcher.url_for(&path), "http://localhost:8000/deck/audio/002.wav");
    }

    #[tokio::test]
    async fn http_fetcher_against_live_router() {
        use axum::Router;
        use axum::http::{StatusCode, header};
        use axum::routing::get;

        let app = Router::new()
            .route("/audio/001.txt", get(|| async { "served text" }))
            .route(
                "/audio/002.txt",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "nope") }),
            )
            .route(
                "/audio/004.txt",
                get(|| async { (StatusCode::FOUND, [(header::LOCATION, "/audio/001.txt")]) }),
            )
            .route(
                "/audio/005.txt",
                get(|| async { (StatusCode::ACCEPTED, "accepted body") }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let fetcher = HttpFetcher::new(&format!("http://{addr}"));
        let ok = fetcher
            .fetch(&ResourcePath::new("audio", "001.txt"))
            .await
            .unwrap();
        assert_eq!(ok, b"served text");

        let err = fetcher
            .fetch(&ResourcePath::new("audio", "002.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));
        assert_eq!(err.to_string(), "Internal Server Error");

        let missing = fetcher
            .fetch(&ResourcePath::new("audio", "003.txt"))
            .await
            .unwrap_err();
        assert!(matches!(missing, FetchError::Status { status: 404, .. }));

        let redirected = fetcher
            .fetch(&ResourcePath::new("audio", "004.txt"))
            .await
            .unwrap();
        assert_eq!(redirected, b"served text");

        let accepted = fetcher
            .fetch(&ResourcePath::new("audio", "005.txt"))
            .await
            .unwrap();
        assert_eq!(accepted, b"accepted body");
    }
}
