//! # owmap
//!
//! A headless tile map and marker engine for open-world game map viewers.
//!
//! The crate keeps the retained state of an interactive map: the viewport,
//! tile layers per region, marker visibility with per-type clustering,
//! label and link overlays, and subregion boundaries. A front-end reads
//! that state (attached layers, icon descriptors, visual classes) and draws
//! it; nothing here touches pixels.

pub mod animation;
pub mod core;
pub mod data;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod session;
pub mod spatial;
pub mod store;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    bounds::Bounds,
    builder::MapBuilder,
    clock::{Clock, ManualClock, SystemClock},
    config::{MapOptions, Region, RegionCatalog, RegionConfig},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::{MapCore, MapState},
    projection::Projection,
    viewport::Viewport,
};

pub use layers::{
    boundary::BoundaryManager,
    label::LabelOverlay,
    link::LinkOverlay,
    marker::{ClusterLayer, MarkerLayer},
};

pub use input::{events::MapEvent, handler::EventManager};

pub use data::marker::{MarkerDataset, MarkerRecord, MarkerType, MarkerTypeCatalog};

pub use session::MapSession;

pub use tiles::{loader::TileFetcher, source::TileUrlProvider};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Region not found: {0}")]
    RegionNotFound(String),

    #[error("Invalid config for region {region}: {reason}")]
    InvalidRegionConfig { region: String, reason: String },

    #[error("Invalid map options: {0}")]
    InvalidOptions(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "http")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Route `log` output to stderr, honouring `RUST_LOG`
#[cfg(feature = "debug")]
pub fn init_debug_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("owmap=debug"))
        .try_init();
}
