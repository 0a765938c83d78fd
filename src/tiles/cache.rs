use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

const FALLBACK_CAPACITY: usize = 1024;

/// What the cache remembers about one tile URL
#[derive(Debug, Clone, PartialEq)]
pub enum CachedTile {
    Data(Arc<Vec<u8>>),
    /// The server answered without a tile; the placeholder stands in for it
    Missing,
}

/// LRU cache of tile bodies keyed by URL, shared between loader clones.
///
/// Known-missing tiles are remembered too so sparse regions do not refetch
/// their empty edges on every pan. Transport errors are never cached.
#[derive(Debug, Clone)]
pub struct TileCache {
    entries: Arc<Mutex<LruCache<String, CachedTile>>>,
}

impl TileCache {
    /// A zero capacity falls back to 1024 entries
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or(NonZeroUsize::new(FALLBACK_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    fn lock(&self) -> Option<MutexGuard<'_, LruCache<String, CachedTile>>> {
        match self.entries.lock() {
            Ok(guard) => Some(guard),
            Err(_) => {
                log::error!("tile cache lock poisoned");
                None
            }
        }
    }

    pub fn get(&self, url: &str) -> Option<CachedTile> {
        self.lock()?.get(url).cloned()
    }

    pub fn put(&self, url: String, data: Arc<Vec<u8>>) {
        if let Some(mut entries) = self.lock() {
            entries.put(url, CachedTile::Data(data));
        }
    }

    pub fn mark_missing(&self, url: String) {
        if let Some(mut entries) = self.lock() {
            entries.put(url, CachedTile::Missing);
        }
    }

    /// Drops every entry whose URL starts with `prefix`, e.g. one region's clips
    pub fn evict_prefix(&self, prefix: &str) -> usize {
        let Some(mut entries) = self.lock() else {
            return 0;
        };
        let stale: Vec<String> = entries
            .iter()
            .filter(|(url, _)| url.starts_with(prefix))
            .map(|(url, _)| url.clone())
            .collect();
        for url in &stale {
            entries.pop(url);
        }
        stale.len()
    }

    pub fn clear(&self) {
        if let Some(mut entries) = self.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().map_or(0, |entries| entries.cap().get())
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(FALLBACK_CAPACITY)
    }
}
