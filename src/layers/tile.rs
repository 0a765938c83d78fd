//! Region tile layer.
//!
//! Covers the region image with `tile_size` tiles up to the region's native
//! zoom; above it the same tiles are upscaled. Tiles outside the image are
//! never requested.

use crate::core::bounds::Bounds;
use crate::core::geo::{LatLngBounds, TileCoord};
use crate::core::projection::Projection;
use crate::core::viewport::Viewport;
use crate::layers::base::{LayerId, LayerProperties, LayerTrait, LayerType};
use crate::prelude::Arc;
use crate::tiles::loader::{TileLoader, TileOutcome};
use crate::tiles::source::{TileSource, UrlTemplate};
use std::collections::BTreeMap;

/// Default skin; selecting it removes the secondary layer
pub const BASE_SKIN: &str = "M";

/// Every skin the viewer offers
pub const SKINS: [&str; 8] = ["M", "B1", "B2", "B3", "B4", "L1", "L2", "L3"];

pub fn is_known_skin(skin: &str) -> bool {
    SKINS.iter().any(|known| known.eq_ignore_ascii_case(skin))
}

/// Summary of one load pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileLoadReport {
    pub requested: usize,
    pub loaded: usize,
    pub cached: usize,
    pub placeholders: usize,
}

/// A tile-based layer covering one region's image
pub struct TileLayer {
    properties: LayerProperties,
    region: String,
    skin: Option<String>,
    source: UrlTemplate,
    tile_size: f64,
    max_native_zoom: u8,
    projection: Projection,
    tiles: BTreeMap<TileCoord, TileOutcome>,
    initial_load_done: bool,
}

impl std::fmt::Debug for TileLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileLayer")
            .field("id", &self.properties.id)
            .field("region", &self.region)
            .field("skin", &self.skin)
            .field("source", &self.source)
            .field("tiles", &self.tiles.len())
            .finish()
    }
}

impl TileLayer {
    pub fn new(
        id: LayerId,
        region: impl Into<String>,
        source: UrlTemplate,
        tile_size: u32,
        projection: Projection,
    ) -> Self {
        Self {
            properties: LayerProperties {
                interactive: false,
                ..LayerProperties::new(id, LayerType::Tile)
            },
            region: region.into(),
            skin: None,
            source,
            tile_size: tile_size as f64,
            max_native_zoom: projection.max_zoom,
            projection,
            tiles: BTreeMap::new(),
            initial_load_done: false,
        }
    }

    /// Marks this layer as a secondary skin drawn above the base tiles
    pub fn with_skin(mut self, skin: impl Into<String>) -> Self {
        self.skin = Some(skin.into());
        self.properties.z_index += 1;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn skin(&self) -> Option<&str> {
        self.skin.as_deref()
    }

    pub fn url_template(&self) -> &UrlTemplate {
        &self.source
    }

    pub fn max_native_zoom(&self) -> u8 {
        self.max_native_zoom
    }

    /// Map-coordinate area covered by tiles
    pub fn bounds(&self) -> LatLngBounds {
        self.projection.max_bounds()
    }

    pub fn is_loaded(&self) -> bool {
        self.initial_load_done
    }

    pub fn tile(&self, coord: &TileCoord) -> Option<&TileOutcome> {
        self.tiles.get(coord)
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Zoom whose tiles are drawn at the viewport's zoom
    pub fn tile_zoom(&self, view_zoom: f64) -> u8 {
        view_zoom.round().clamp(0.0, self.max_native_zoom as f64) as u8
    }

    /// Tiles intersecting the viewport, row-major
    pub fn visible_tiles(&self, viewport: &Viewport) -> Vec<TileCoord> {
        let tile_zoom = self.tile_zoom(viewport.zoom);
        let scale = Projection::scale(viewport.zoom - tile_zoom as f64);

        let center = viewport.project(&viewport.center, Some(tile_zoom as f64));
        let view = Bounds::around(center, viewport.size.multiply(1.0 / scale));

        let level_scale = Projection::scale(tile_zoom as f64 - self.max_native_zoom as f64);
        let [w, h] = self.projection.dimensions;
        let image = Bounds::image(w * level_scale, h * level_scale);

        let Some(((min_x, max_x), (min_y, max_y))) = view
            .intersection(&image)
            .and_then(|covered| covered.tile_range(self.tile_size))
        else {
            return Vec::new();
        };

        let mut coords = Vec::new();
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                coords.push(TileCoord::new(x, y, tile_zoom));
            }
        }
        coords
    }

    /// Loads visible tiles that are not present yet. Resolves once every
    /// requested tile has either loaded or been replaced by a placeholder;
    /// immediately if nothing was needed.
    pub async fn load_visible(&mut self, viewport: &Viewport, loader: &TileLoader) -> TileLoadReport {
        let wanted: Vec<TileCoord> = self
            .visible_tiles(viewport)
            .into_iter()
            .filter(|coord| !self.tiles.contains_key(coord))
            .collect();

        let mut report = TileLoadReport {
            requested: wanted.len(),
            ..TileLoadReport::default()
        };

        if !wanted.is_empty() {
            let urls = wanted.iter().map(|coord| self.source.url(*coord)).collect();
            let results = loader.load_all(urls).await;
            for (coord, (_, outcome)) in wanted.into_iter().zip(results) {
                match outcome {
                    TileOutcome::Loaded(_) => report.loaded += 1,
                    TileOutcome::Cached(_) => report.cached += 1,
                    TileOutcome::Placeholder => report.placeholders += 1,
                }
                self.tiles.insert(coord, outcome);
            }
        }

        self.initial_load_done = true;
        log::debug!(
            "{} ({}) loaded {:?}",
            self.properties.id,
            self.region,
            report
        );
        report
    }

    /// Image data for a loaded tile, placeholders included
    pub fn tile_data(&self, coord: &TileCoord) -> Option<Arc<Vec<u8>>> {
        self.tiles.get(coord).map(TileOutcome::data)
    }
}

impl LayerTrait for TileLayer {
    impl_layer_trait!(properties);
}
