use crate::prelude::{Arc, HashMap};
use crate::tiles::cache::{CachedTile, TileCache};
use crate::Result;
use async_trait::async_trait;
use futures::future::join_all;
use once_cell::sync::Lazy;
use std::sync::Mutex;

/// 1×1 transparent PNG substituted for missing tiles
pub static TRANSPARENT_TILE: Lazy<Arc<Vec<u8>>> = Lazy::new(|| {
    use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};

    let pixel = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    if let Err(err) = DynamicImage::ImageRgba8(pixel).write_to(&mut bytes, ImageOutputFormat::Png) {
        log::warn!("failed to encode placeholder tile: {}", err);
    }
    Arc::new(bytes.into_inner())
});

/// Fetches raw tile bytes. `Ok(None)` means the tile does not exist (HTTP 404).
#[async_trait]
pub trait TileFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>>;
}

#[cfg(feature = "http")]
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("owmap/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

/// Plain HTTP GET of static tile images
#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct HttpTileFetcher;

#[cfg(feature = "http")]
#[async_trait]
impl TileFetcher for HttpTileFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let response = HTTP_CLIENT.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status()?;
        Ok(Some(response.bytes().await?.to_vec()))
    }
}

/// Serves tiles from memory; unknown URLs behave like a 404
#[derive(Debug, Default)]
pub struct MemoryTileFetcher {
    tiles: Mutex<HashMap<String, Vec<u8>>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryTileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, data: Vec<u8>) {
        if let Ok(mut tiles) = self.tiles.lock() {
            tiles.insert(url.into(), data);
        }
    }

    /// Every URL requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TileFetcher for MemoryTileFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        Ok(self
            .tiles
            .lock()
            .ok()
            .and_then(|tiles| tiles.get(url).cloned()))
    }
}

/// What happened to one requested tile
#[derive(Debug, Clone, PartialEq)]
pub enum TileOutcome {
    Loaded(Arc<Vec<u8>>),
    Cached(Arc<Vec<u8>>),
    /// Missing or failed; the transparent placeholder is shown instead
    Placeholder,
}

impl TileOutcome {
    pub fn data(&self) -> Arc<Vec<u8>> {
        match self {
            TileOutcome::Loaded(data) | TileOutcome::Cached(data) => data.clone(),
            TileOutcome::Placeholder => TRANSPARENT_TILE.clone(),
        }
    }
}

/// Fetches tile batches through a [`TileFetcher`] with an LRU cache in front
#[derive(Clone)]
pub struct TileLoader {
    fetcher: Arc<dyn TileFetcher>,
    cache: TileCache,
    max_concurrent: usize,
}

impl std::fmt::Debug for TileLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileLoader")
            .field("cache", &self.cache.len())
            .field("max_concurrent", &self.max_concurrent)
            .finish()
    }
}

impl TileLoader {
    pub fn new(fetcher: Arc<dyn TileFetcher>, cache_size: usize, max_concurrent: usize) -> Self {
        Self {
            fetcher,
            cache: TileCache::new(cache_size),
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    /// Loads every URL, at most `max_concurrent` in flight at a time.
    /// Failures never propagate; they become placeholders.
    pub async fn load_all(&self, urls: Vec<String>) -> Vec<(String, TileOutcome)> {
        let mut results = Vec::with_capacity(urls.len());
        for batch in urls.chunks(self.max_concurrent) {
            let fetches = batch.iter().map(|url| self.load_one(url.clone()));
            results.extend(join_all(fetches).await);
        }
        results
    }

    async fn load_one(&self, url: String) -> (String, TileOutcome) {
        match self.cache.get(&url) {
            Some(CachedTile::Data(data)) => return (url, TileOutcome::Cached(data)),
            Some(CachedTile::Missing) => return (url, TileOutcome::Placeholder),
            None => {}
        }

        let outcome = match self.fetcher.fetch(&url).await {
            Ok(Some(bytes)) => {
                let data = Arc::new(bytes);
                self.cache.put(url.clone(), data.clone());
                TileOutcome::Loaded(data)
            }
            Ok(None) => {
                log::trace!("tile {} missing, using placeholder", url);
                self.cache.mark_missing(url.clone());
                TileOutcome::Placeholder
            }
            Err(err) => {
                log::warn!("tile {} failed to load: {}", url, err);
                TileOutcome::Placeholder
            }
        };
        (url, outcome)
    }
}
