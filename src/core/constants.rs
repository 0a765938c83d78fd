//! Engine-wide constants for game-map viewers.
//! Values that users may tune live in [`crate::core::config::MapOptions`]; these do not change.

/// Zoom levels beyond a region's native tile zoom that the viewport allows (browser-style upscaling).
pub const OVERSCALE_ZOOM_LEVELS: f64 = 1.0;

/// Default zoom when no region is loaded yet.
pub const DEFAULT_ZOOM: f64 = 0.0;

/// Region loaded when nothing is persisted.
pub const DEFAULT_REGION: &str = "Valley_4";

/// Marker categories whose types are aggregated into cluster groups.
pub const CLUSTER_CATEGORIES: [&str; 2] = ["enemy", "resource"];

/// Cluster bubbles split into single markers at and above this zoom.
pub const DISABLE_CLUSTERING_AT_ZOOM: f64 = 2.0;

/// Grid cell size for cluster bubbles, in screen pixels.
pub const MAX_CLUSTER_RADIUS: f64 = 60.0;

/// Sub-area labels are shown at or below this zoom, site labels above it.
pub const LABEL_ZOOM_THRESHOLD: f64 = 0.25;

/// Zoom that subregion switch requests centre the camera at.
pub const SUBREGION_FOCUS_ZOOM: f64 = 1.0;

/// Framed marker icon size and hot-spot.
pub const MARKER_ICON_SIZE: (u32, u32) = (32, 32);
pub const MARKER_ICON_ANCHOR: (u32, u32) = (16, 16);

/// Frameless marker icon size and hot-spot.
pub const NO_FRAME_ICON_SIZE: (u32, u32) = (50, 50);
pub const NO_FRAME_ICON_ANCHOR: (u32, u32) = (25, 25);

/// Pane stacking order (tiles sit in the default tile pane at 200).
pub const TILE_PANE_Z_INDEX: i32 = 200;
pub const BOUNDARY_PANE_Z_INDEX: i32 = 400;
pub const MARKER_PANE_Z_INDEX: i32 = 600;
pub const LINK_PANE_Z_INDEX: i32 = 640;
pub const LABEL_PANE_Z_INDEX: i32 = 650;

/// Opacity of the base tiles while a secondary skin is shown above them.
pub const SECONDARY_BASE_OPACITY: f32 = 0.4;

/// Data format version for label and link bundles.
pub const OVERLAY_DATA_VERSION: u32 = 1;
