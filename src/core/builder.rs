//! Map builder for fluent configuration
//!
//! Every collaborator of [`MapCore`] has a sensible default, so a map can be
//! built from a region catalog alone; tests swap in an in-memory tile fetcher
//! and a manual clock.

use crate::{
    core::{
        clock::{Clock, SystemClock},
        config::{MapOptions, RegionCatalog},
        map::MapCore,
    },
    data::{marker::MarkerTypeCatalog, region::SubregionCatalog},
    layers::{boundary::BoundaryManager, marker::MarkerLayer},
    store::{
        storage::Storage,
        view_state::{MemoryViewStates, PersistentViewStates, ViewStateStore},
    },
    tiles::{
        loader::{TileFetcher, TileLoader},
        source::{AssetTileUrls, TileUrlProvider},
    },
    MapError, Result,
};
use std::sync::Arc;

/// Builder for [`MapCore`]
pub struct MapBuilder {
    options: MapOptions,
    regions: RegionCatalog,
    marker_types: Arc<MarkerTypeCatalog>,
    subregions: Arc<SubregionCatalog>,
    fetcher: Option<Arc<dyn TileFetcher>>,
    tile_urls: Option<Arc<dyn TileUrlProvider>>,
    view_states: Option<Box<dyn ViewStateStore>>,
    storage: Option<Arc<dyn Storage>>,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for MapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MapBuilder {
    pub fn new() -> Self {
        Self {
            options: MapOptions::default(),
            regions: RegionCatalog::new(),
            marker_types: Arc::new(MarkerTypeCatalog::new()),
            subregions: Arc::new(SubregionCatalog::new()),
            fetcher: None,
            tile_urls: None,
            view_states: None,
            storage: None,
            clock: None,
        }
    }

    pub fn with_options(mut self, options: MapOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_regions(mut self, regions: RegionCatalog) -> Self {
        self.regions = regions;
        self
    }

    pub fn with_marker_types(mut self, catalog: Arc<MarkerTypeCatalog>) -> Self {
        self.marker_types = catalog;
        self
    }

    /// Subregion outlines used for boundaries, highlights and focus moves
    pub fn with_subregions(mut self, subregions: Arc<SubregionCatalog>) -> Self {
        self.subregions = subregions;
        self
    }

    pub fn with_tile_fetcher(mut self, fetcher: Arc<dyn TileFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Overrides the default `/clips/{region}/{z}/{x}_{y}.webp` layout
    pub fn with_tile_urls(mut self, tile_urls: Arc<dyn TileUrlProvider>) -> Self {
        self.tile_urls = Some(tile_urls);
        self
    }

    pub fn with_view_states(mut self, view_states: Box<dyn ViewStateStore>) -> Self {
        self.view_states = Some(view_states);
        self
    }

    /// Backend for view states when `persist_view_state` is on
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    fn validate(options: &MapOptions) -> Result<()> {
        let invalid = |reason: &str| Err(MapError::InvalidOptions(reason.to_string()));
        if !options.min_zoom.is_finite() {
            return invalid("min_zoom must be finite");
        }
        if options.zoom_snap < 0.0 || options.zoom_delta <= 0.0 {
            return invalid("zoom_snap must be >= 0 and zoom_delta > 0");
        }
        if options.viewport_size.x <= 0.0 || options.viewport_size.y <= 0.0 {
            return invalid("viewport_size must be positive");
        }
        if options.tiles.cache_size == 0 || options.tiles.max_concurrent == 0 {
            return invalid("tile cache_size and max_concurrent must be positive");
        }
        Ok(())
    }

    #[cfg(feature = "http")]
    fn default_fetcher() -> Arc<dyn TileFetcher> {
        Arc::new(crate::tiles::loader::HttpTileFetcher)
    }

    #[cfg(not(feature = "http"))]
    fn default_fetcher() -> Arc<dyn TileFetcher> {
        Arc::new(crate::tiles::loader::MemoryTileFetcher::new())
    }

    pub fn build(self) -> Result<MapCore> {
        Self::validate(&self.options)?;

        let options = self.options;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));
        let fetcher = self.fetcher.unwrap_or_else(Self::default_fetcher);
        let tile_urls = self
            .tile_urls
            .unwrap_or_else(|| Arc::new(AssetTileUrls::new(options.asset_host.clone())));
        let view_states = match (self.view_states, self.storage) {
            (Some(view_states), _) => view_states,
            (None, Some(storage)) if options.persist_view_state => {
                Box::new(PersistentViewStates::load(storage)) as Box<dyn ViewStateStore>
            }
            _ => Box::new(MemoryViewStates::new()),
        };

        let transitions = &options.transitions;
        let boundaries = BoundaryManager::new(
            self.subregions,
            clock.clone(),
            transitions.boundary_fade(),
            transitions.highlight(),
        );
        let marker_layer = MarkerLayer::new(
            self.marker_types,
            clock.clone(),
            options.asset_host.clone(),
            transitions.marker_fade(),
        );
        let tiles = TileLoader::new(fetcher, options.tiles.cache_size, options.tiles.max_concurrent);

        Ok(MapCore::from_parts(
            options,
            self.regions,
            clock,
            tiles,
            tile_urls,
            view_states,
            boundaries,
            marker_layer,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::Point;

    #[test]
    fn test_defaults_build() {
        let map = MapBuilder::new().build().unwrap();
        assert!(map.region().is_none());
        assert_eq!(map.skin(), "M");
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let options = MapOptions {
            viewport_size: Point::new(0.0, 720.0),
            ..MapOptions::default()
        };
        assert!(matches!(
            MapBuilder::new().with_options(options).build(),
            Err(MapError::InvalidOptions(_))
        ));
    }
}
