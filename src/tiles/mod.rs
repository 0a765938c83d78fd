pub mod cache;
pub mod loader;
pub mod source;

pub use cache::{CachedTile, TileCache};
#[cfg(feature = "http")]
pub use loader::HttpTileFetcher;
pub use loader::{MemoryTileFetcher, TileFetcher, TileLoader, TileOutcome, TRANSPARENT_TILE};
pub use source::{AssetTileUrls, TileSource, TileUrlProvider, UrlTemplate};
