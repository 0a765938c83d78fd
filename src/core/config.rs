//! Region catalog and engine options.
//!
//! Region configs are loaded from the same JSON shape the asset pipeline
//! produces (`dimensions`, `maxZoom`, `tileSize`, `initialOffset`,
//! `initialZoom`, `subregions`). Fields are optional at parse time so a broken
//! entry fails only when a switch to that region is attempted.

use crate::animation::EasingType;
use crate::core::constants;
use crate::core::geo::Point;
use crate::core::projection::Projection;
use crate::prelude::HashMap;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

/// Region entry as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionConfig {
    pub dimensions: Option<Vec<f64>>,
    pub tile_size: Option<u32>,
    pub max_zoom: Option<u8>,
    pub initial_offset: Option<Offset>,
    pub initial_zoom: Option<f64>,
    #[serde(default)]
    pub subregions: Vec<String>,
    /// Short code used by label/link data and locale keys
    #[serde(default)]
    pub code: Option<String>,
}

/// A validated region, ready for the map to switch to
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub key: String,
    pub code: String,
    pub dimensions: [f64; 2],
    pub tile_size: u32,
    pub max_zoom: u8,
    pub initial_offset: Point,
    pub initial_zoom: f64,
    pub subregions: Vec<String>,
}

impl Region {
    pub fn projection(&self) -> Projection {
        Projection::new(self.dimensions, self.max_zoom)
    }

    /// Highest zoom the viewport allows (one level of upscaling past native tiles)
    pub fn max_view_zoom(&self) -> f64 {
        self.max_zoom as f64 + constants::OVERSCALE_ZOOM_LEVELS
    }

    pub fn has_subregion(&self, subregion: &str) -> bool {
        self.subregions.iter().any(|s| s == subregion)
    }
}

/// Built-in region codes for the shipped regions
pub fn default_region_code(region: &str) -> Option<&'static str> {
    match region {
        "Valley_4" => Some("VL"),
        "Wuling" => Some("WL"),
        "Dijiang" => Some("DJ"),
        "Weekraid_1" => Some("ES"),
        "Jinlong" => Some("JL"),
        _ => None,
    }
}

impl RegionConfig {
    /// Checks required fields and produces a [`Region`]
    pub fn validated(&self, key: &str) -> Result<Region> {
        let invalid = |reason: &str| MapError::InvalidRegionConfig {
            region: key.to_string(),
            reason: reason.to_string(),
        };

        let max_zoom = self.max_zoom.ok_or_else(|| invalid("missing maxZoom"))?;
        let initial_zoom = self
            .initial_zoom
            .ok_or_else(|| invalid("missing initialZoom"))?;
        let offset = self
            .initial_offset
            .ok_or_else(|| invalid("missing initialOffset"))?;
        let dimensions = match self.dimensions.as_deref() {
            Some([w, h]) if *w > 0.0 && *h > 0.0 => [*w, *h],
            Some(_) => return Err(invalid("dimensions must be two positive numbers")),
            None => return Err(invalid("missing dimensions")),
        };
        let tile_size = self.tile_size.unwrap_or(256);
        if tile_size == 0 {
            return Err(invalid("tileSize must be positive"));
        }

        let subregions = if self.subregions.is_empty() {
            vec![key.to_string()]
        } else {
            self.subregions.clone()
        };
        let code = self
            .code
            .clone()
            .or_else(|| default_region_code(key).map(str::to_string))
            .unwrap_or_else(|| key.to_string());

        Ok(Region {
            key: key.to_string(),
            code,
            dimensions,
            tile_size,
            max_zoom,
            initial_offset: Point::new(offset.x, offset.y),
            initial_zoom,
            subregions,
        })
    }
}

/// All regions known to the application
#[derive(Debug, Clone, Default)]
pub struct RegionCatalog {
    regions: HashMap<String, RegionConfig>,
    order: Vec<String>,
}

impl RegionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: std::collections::BTreeMap<String, RegionConfig> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for (key, config) in raw {
            catalog.insert(key, config);
        }
        Ok(catalog)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn insert(&mut self, key: impl Into<String>, config: RegionConfig) {
        let key = key.into();
        if self.regions.insert(key.clone(), config).is_none() {
            self.order.push(key);
        }
    }

    pub fn get(&self, key: &str) -> Option<&RegionConfig> {
        self.regions.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.regions.contains_key(key)
    }

    /// Looks up and validates a region
    pub fn resolve(&self, key: &str) -> Result<Region> {
        self.regions
            .get(key)
            .ok_or_else(|| MapError::RegionNotFound(key.to_string()))?
            .validated(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Region whose subregion list contains `subregion`
    pub fn region_of_subregion(&self, subregion: &str) -> Option<&str> {
        self.order
            .iter()
            .find(|key| {
                self.regions.get(key.as_str()).map_or(false, |config| {
                    config.subregions.iter().any(|s| s == subregion)
                        || (config.subregions.is_empty() && key.as_str() == subregion)
                })
            })
            .map(String::as_str)
    }

    /// Region key for a region code
    pub fn region_by_code(&self, code: &str) -> Option<&str> {
        self.order
            .iter()
            .find(|key| {
                self.regions.get(key.as_str()).map_or(false, |config| {
                    config.code.as_deref().or_else(|| default_region_code(key)) == Some(code)
                })
            })
            .map(String::as_str)
    }
}

/// Durations for every delayed visual change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub marker_fade_ms: u64,
    pub boundary_fade_ms: u64,
    pub label_fade_ms: u64,
    pub highlight_ms: u64,
    pub link_tooltip_hide_ms: u64,
    pub camera_duration_ms: u64,
    pub camera_easing: EasingType,
}

impl TransitionConfig {
    pub fn marker_fade(&self) -> Duration {
        Duration::from_millis(self.marker_fade_ms)
    }

    pub fn boundary_fade(&self) -> Duration {
        Duration::from_millis(self.boundary_fade_ms)
    }

    pub fn label_fade(&self) -> Duration {
        Duration::from_millis(self.label_fade_ms)
    }

    pub fn highlight(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }

    pub fn link_tooltip_hide(&self) -> Duration {
        Duration::from_millis(self.link_tooltip_hide_ms)
    }

    pub fn camera_duration(&self) -> Duration {
        Duration::from_millis(self.camera_duration_ms)
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            marker_fade_ms: 160,
            boundary_fade_ms: 300,
            label_fade_ms: 200,
            highlight_ms: 1500,
            link_tooltip_hide_ms: 200,
            camera_duration_ms: 250,
            camera_easing: EasingType::EaseOut,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLoadingConfig {
    /// Tiles kept in the LRU cache
    pub cache_size: usize,
    /// Fetches in flight per batch
    pub max_concurrent: usize,
    pub secondary_base_opacity: f32,
}

impl Default for TileLoadingConfig {
    fn default() -> Self {
        Self {
            cache_size: 1024,
            max_concurrent: 6,
            secondary_base_opacity: constants::SECONDARY_BASE_OPACITY,
        }
    }
}

/// Map-wide options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub min_zoom: f64,
    pub zoom_snap: f64,
    pub zoom_delta: f64,
    pub viewport_size: Point,
    /// Prefix for tile and icon URLs
    pub asset_host: String,
    pub transitions: TransitionConfig,
    pub tiles: TileLoadingConfig,
    /// Write view states through to storage
    pub persist_view_state: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            min_zoom: 0.0,
            zoom_snap: 0.25,
            zoom_delta: 0.25,
            viewport_size: Point::new(1280.0, 720.0),
            asset_host: String::new(),
            transitions: TransitionConfig::default(),
            tiles: TileLoadingConfig::default(),
            persist_view_state: true,
        }
    }
}

impl MapOptions {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGIONS: &str = r#"{
        "Valley_4": {
            "dimensions": [8000, 10000],
            "tileSize": 200,
            "maxZoom": 3,
            "initialOffset": { "x": 750, "y": 250 },
            "initialZoom": 2,
            "subregions": ["Valley_4"]
        },
        "Wuling": {
            "dimensions": [6000, 6000],
            "tileSize": 200,
            "maxZoom": 3,
            "initialOffset": { "x": 0, "y": 0 },
            "initialZoom": 1,
            "subregions": ["Wuling_1", "Wuling_2"]
        },
        "Broken": { "dimensions": [100, 100] },
        "Solo": {
            "dimensions": [100, 100],
            "maxZoom": 1,
            "initialOffset": { "x": 0, "y": 0 },
            "initialZoom": 0
        }
    }"#;

    #[test]
    fn test_resolve_region() {
        let catalog = RegionCatalog::from_json_str(REGIONS).unwrap();
        let region = catalog.resolve("Valley_4").unwrap();
        assert_eq!(region.dimensions, [8000.0, 10000.0]);
        assert_eq!(region.tile_size, 200);
        assert_eq!(region.code, "VL");
        assert_eq!(region.max_view_zoom(), 4.0);
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let catalog = RegionCatalog::from_json_str(REGIONS).unwrap();
        match catalog.resolve("Broken") {
            Err(MapError::InvalidRegionConfig { region, reason }) => {
                assert_eq!(region, "Broken");
                assert!(reason.contains("maxZoom"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(
            catalog.resolve("Nowhere"),
            Err(MapError::RegionNotFound(_))
        ));
    }

    #[test]
    fn test_empty_subregions_use_region_key() {
        let catalog = RegionCatalog::from_json_str(REGIONS).unwrap();
        assert_eq!(catalog.resolve("Solo").unwrap().subregions, vec!["Solo"]);
        assert_eq!(catalog.region_of_subregion("Solo"), Some("Solo"));
        assert_eq!(catalog.region_of_subregion("Wuling_2"), Some("Wuling"));
        assert_eq!(catalog.region_by_code("WL"), Some("Wuling"));
    }

    #[test]
    fn test_options_from_partial_json() {
        let options = MapOptions::from_json_str(r#"{ "asset_host": "https://cdn", "transitions": { "marker_fade_ms": 100 } }"#).unwrap();
        assert_eq!(options.asset_host, "https://cdn");
        assert_eq!(options.transitions.marker_fade_ms, 100);
        assert_eq!(options.transitions.boundary_fade_ms, 300);
        assert_eq!(options.zoom_snap, 0.25);
    }
}
