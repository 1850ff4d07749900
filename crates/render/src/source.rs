//! Asset sources.
//!
//! Sprite sheets, the filmstrip sprite and metadata documents are addressed
//! by a location string. `http(s)://` locations are fetched with `reqwest`;
//! anything else is read from the local filesystem.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use scrubkit_common::error::{ScrubError, ScrubResult};

/// Fetches raw asset bytes by location.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Fetch the full body of the asset at `location`.
    async fn fetch(&self, location: &str) -> ScrubResult<Vec<u8>>;

    /// Human-readable backend name.
    fn name(&self) -> &str;
}

/// Whether a location should be fetched over HTTP.
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// HTTP(S) asset backend.
pub struct HttpAssetSource {
    client: reqwest::Client,
}

impl HttpAssetSource {
    pub fn new() -> ScrubResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("scrubkit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScrubError::Other(anyhow::anyhow!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AssetSource for HttpAssetSource {
    async fn fetch(&self, location: &str) -> ScrubResult<Vec<u8>> {
        let response = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| ScrubError::asset(location, e.to_string()))?
            .error_for_status()
            .map_err(|e| ScrubError::asset(location, e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ScrubError::asset(location, format!("reading body: {e}")))?;

        tracing::debug!(location, bytes = bytes.len(), "Fetched remote asset");
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Local filesystem backend. Relative locations resolve against `root`.
pub struct FsAssetSource {
    root: Option<PathBuf>,
}

impl FsAssetSource {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, location: &str) -> PathBuf {
        let path = PathBuf::from(location.strip_prefix("file://").unwrap_or(location));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }
}

impl Default for FsAssetSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetSource for FsAssetSource {
    async fn fetch(&self, location: &str) -> ScrubResult<Vec<u8>> {
        let path = self.resolve(location);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ScrubError::FileNotFound { path })
            }
            Err(e) => Err(ScrubError::asset(location, e.to_string())),
        }
    }

    fn name(&self) -> &str {
        "filesystem"
    }
}

/// Routes each location to the HTTP or filesystem backend.
pub struct RoutedAssetSource {
    http: HttpAssetSource,
    fs: FsAssetSource,
}

impl RoutedAssetSource {
    pub fn new(fs: FsAssetSource) -> ScrubResult<Self> {
        Ok(Self {
            http: HttpAssetSource::new()?,
            fs,
        })
    }
}

#[async_trait]
impl AssetSource for RoutedAssetSource {
    async fn fetch(&self, location: &str) -> ScrubResult<Vec<u8>> {
        if is_remote(location) {
            self.http.fetch(location).await
        } else {
            self.fs.fetch(location).await
        }
    }

    fn name(&self) -> &str {
        "routed"
    }
}

/// In-memory assets, keyed by location. Used for embedding and for
/// exercising loaders without a network.
#[derive(Default)]
pub struct MemoryAssetSource {
    assets: Mutex<HashMap<String, Vec<u8>>>,
    fetches: Mutex<HashMap<String, usize>>,
    latency: Option<Duration>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every fetch by `latency`.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn insert(&self, location: impl Into<String>, bytes: Vec<u8>) {
        self.assets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(location.into(), bytes);
    }

    pub fn remove(&self, location: &str) {
        self.assets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(location);
    }

    /// How many times `location` has been requested.
    pub fn fetch_count(&self, location: &str) -> usize {
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(location)
            .copied()
            .unwrap_or(0)
    }

    /// Requests across all locations.
    pub fn total_fetches(&self) -> usize {
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }
}

#[async_trait]
impl AssetSource for MemoryAssetSource {
    async fn fetch(&self, location: &str) -> ScrubResult<Vec<u8>> {
        *self
            .fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(location.to_string())
            .or_insert(0) += 1;

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.assets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(location)
            .cloned()
            .ok_or_else(|| ScrubError::asset(location, "not found"))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// The default source: HTTP for URLs, filesystem for everything else.
pub fn default_source() -> ScrubResult<Arc<dyn AssetSource>> {
    Ok(Arc::new(RoutedAssetSource::new(FsAssetSource::new())?))
}
