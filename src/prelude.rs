//! Prelude module for common owmap types and traits
//!
//! This module re-exports the most commonly used types for easy importing
//! with `use owmap::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    builder::MapBuilder,
    clock::{Clock, ManualClock, SystemClock},
    config::{MapOptions, Region, RegionCatalog, RegionConfig, TileLoadingConfig, TransitionConfig},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::{MapCore, MapState},
    projection::Projection,
    viewport::Viewport,
};

pub use crate::animation::{CameraTransition, EasingType, FadeScheduler};

pub use crate::layers::{
    base::{LayerId, LayerProperties, LayerTrait, LayerType, Pane},
    boundary::BoundaryManager,
    label::{LabelOverlay, LabelKind},
    link::LinkOverlay,
    manager::LayerManager,
    marker::{ClusterLayer, Container, MarkerHandle, MarkerLayer, VisualClass},
    tile::TileLayer,
};

pub use crate::input::{
    events::{EventKind, LassoEvent, MapEvent},
    handler::EventManager,
};

pub use crate::data::{
    label::LabelData,
    link::LinkData,
    locale::{JsonLocale, LocaleLookup},
    marker::{MarkerDataset, MarkerRecord, MarkerType, MarkerTypeCatalog},
    region::{SubregionArea, SubregionCatalog},
};

pub use crate::store::{
    marker::MarkerStore,
    prefs::MapPrefs,
    region::RegionStore,
    storage::{FileStorage, MemoryStorage, Storage},
    user_record::UserRecord,
    view_state::{MemoryViewStates, PersistentViewStates, ViewState, ViewStateStore},
};

pub use crate::tiles::{
    cache::TileCache,
    loader::{TileFetcher, TileLoader},
    source::{AssetTileUrls, TileUrlProvider},
};

pub use crate::session::MapSession;

pub use crate::{Error as MapError, Result};

pub use std::{sync::Arc, time::Duration};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};
