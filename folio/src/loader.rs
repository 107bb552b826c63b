//! Index loading
//!
//! The page index is fetched once, in the background, when the panel starts.
//! Its progress is published through a `watch` channel so the panel can ask
//! "is the index ready?" on every keystroke without blocking. A failed load
//! is logged and never retried; the panel keeps reporting "loading".

use crate::config::{FieldWeights, PanelConfig};
use crate::interface::FolioError;
use crate::search::SearchEngine;
use crate::snapshot::IndexSnapshot;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};
use url::Url;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the serialized page index comes from
#[async_trait]
pub trait IndexSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, FolioError>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// `GET` of the published `index.json`
pub struct HttpIndexSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpIndexSource {
    pub fn new(url: Url) -> Result<Self, FolioError> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { client, url })
    }

    /// The configured `index_url`, resolved against the page's site.
    pub fn for_site(config: &PanelConfig, site: &Url) -> Result<Self, FolioError> {
        Self::new(config.index_url_for(site)?)
    }
}

#[async_trait]
impl IndexSource for HttpIndexSource {
    async fn fetch(&self) -> Result<Vec<u8>, FolioError> {
        let response = self.client.get(self.url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(FolioError::HttpStatus(response.status().as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// An `index.json` on local disk, e.g. a site's build output
pub struct FileIndexSource {
    path: PathBuf,
}

impl FileIndexSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl IndexSource for FileIndexSource {
    async fn fetch(&self) -> Result<Vec<u8>, FolioError> {
        Ok(tokio::fs::read(&self.path).await?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Index body already in memory
pub struct StaticIndexSource {
    body: Vec<u8>,
}

impl StaticIndexSource {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self { body: body.into() }
    }
}

#[async_trait]
impl IndexSource for StaticIndexSource {
    async fn fetch(&self) -> Result<Vec<u8>, FolioError> {
        Ok(self.body.clone())
    }

    fn describe(&self) -> String {
        format!("<{} bytes in memory>", self.body.len())
    }
}

/// Pick a source for a CLI-style location: `http(s)://` URLs are fetched,
/// anything else is read from disk.
pub fn source_for(location: &str) -> Result<Arc<dyn IndexSource>, FolioError> {
    if location.starts_with("http://") || location.starts_with("https://") {
        let url = Url::parse(location).map_err(|e| FolioError::Config(e.to_string()))?;
        return Ok(Arc::new(HttpIndexSource::new(url)?));
    }
    Ok(Arc::new(FileIndexSource::new(location)))
}

#[derive(Clone)]
pub enum LoadState {
    Pending,
    Ready(Arc<SearchEngine>),
    Failed(String),
}

impl LoadState {
    pub fn engine(&self) -> Option<&Arc<SearchEngine>> {
        match self {
            LoadState::Ready(engine) => Some(engine),
            _ => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, LoadState::Pending)
    }
}

impl fmt::Debug for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::Pending => f.write_str("Pending"),
            LoadState::Ready(engine) => write!(f, "Ready({} docs)", engine.num_docs()),
            LoadState::Failed(reason) => f.debug_tuple("Failed").field(reason).finish(),
        }
    }
}

/// Fetch, parse and index. Index building runs on the blocking pool.
pub async fn load_index(source: &dyn IndexSource, weights: FieldWeights) -> Result<SearchEngine, FolioError> {
    let bytes = source.fetch().await?;
    let snapshot = IndexSnapshot::from_json(&bytes)?;
    tokio::task::spawn_blocking(move || SearchEngine::build(snapshot, weights))
        .await
        .map_err(|e| FolioError::Index(e.to_string()))?
}

/// Start the one-shot background load. The receiver starts at `Pending` and
/// settles on `Ready` or `Failed` exactly once.
pub fn spawn_index_load(
    runtime: &Handle,
    source: Arc<dyn IndexSource>,
    weights: FieldWeights,
) -> (watch::Receiver<LoadState>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(LoadState::Pending);
    let handle = runtime.spawn(async move {
        let state = match load_index(source.as_ref(), weights).await {
            Ok(engine) => {
                info!(source = %source.describe(), docs = engine.num_docs(), "search index ready");
                LoadState::Ready(Arc::new(engine))
            }
            Err(e) => {
                error!(source = %source.describe(), error = %e, "Error loading search index");
                LoadState::Failed(e.to_string())
            }
        };
        tx.send_replace(state);
    });
    (rx, handle)
}
