use crate::core::constants;
use serde::{Deserialize, Serialize};

/// Identity of everything that can be attached to the viewport
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LayerId {
    BaseTiles,
    SecondaryTiles,
    /// Plain marker group of one subregion
    SubregionGroup(String),
    /// Aggregation group of one marker type
    ClusterGroup(String),
    Labels,
    Links,
    /// Outline of one subregion (fill + stroke)
    Boundary(String),
    /// Temporary emphasis of one subregion
    Highlight(String),
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerId::BaseTiles => write!(f, "tiles:base"),
            LayerId::SecondaryTiles => write!(f, "tiles:secondary"),
            LayerId::SubregionGroup(id) => write!(f, "markers:{}", id),
            LayerId::ClusterGroup(id) => write!(f, "cluster:{}", id),
            LayerId::Labels => write!(f, "labels"),
            LayerId::Links => write!(f, "links"),
            LayerId::Boundary(id) => write!(f, "boundary:{}", id),
            LayerId::Highlight(id) => write!(f, "highlight:{}", id),
        }
    }
}

impl LayerId {
    /// Pane the layer is drawn in
    pub fn pane(&self) -> Pane {
        match self {
            LayerId::BaseTiles | LayerId::SecondaryTiles => Pane::Tile,
            LayerId::SubregionGroup(_) | LayerId::ClusterGroup(_) => Pane::Marker,
            LayerId::Labels => Pane::Label,
            LayerId::Links => Pane::Link,
            LayerId::Boundary(_) | LayerId::Highlight(_) => Pane::Overlay,
        }
    }
}

/// Stacking panes, bottom to top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pane {
    Tile,
    Overlay,
    Marker,
    Link,
    Label,
}

impl Pane {
    pub fn z_index(self) -> i32 {
        match self {
            Pane::Tile => constants::TILE_PANE_Z_INDEX,
            Pane::Overlay => constants::BOUNDARY_PANE_Z_INDEX,
            Pane::Marker => constants::MARKER_PANE_Z_INDEX,
            Pane::Link => constants::LINK_PANE_Z_INDEX,
            Pane::Label => constants::LABEL_PANE_Z_INDEX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Tile,
    Marker,
    Cluster,
    Label,
    Link,
    Shape,
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerType::Tile => write!(f, "tile"),
            LayerType::Marker => write!(f, "marker"),
            LayerType::Cluster => write!(f, "cluster"),
            LayerType::Label => write!(f, "label"),
            LayerType::Link => write!(f, "link"),
            LayerType::Shape => write!(f, "shape"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerProperties {
    pub id: LayerId,
    pub layer_type: LayerType,
    pub z_index: i32,
    pub opacity: f32,
    pub visible: bool,
    pub interactive: bool,
}

impl LayerProperties {
    pub fn new(id: LayerId, layer_type: LayerType) -> Self {
        let z_index = id.pane().z_index();
        Self {
            id,
            layer_type,
            z_index,
            opacity: 1.0,
            visible: true,
            interactive: true,
        }
    }
}

/// Common surface of the layer objects MapCore owns
pub trait LayerTrait {
    fn id(&self) -> &LayerId;
    fn layer_type(&self) -> LayerType;
    /// Stacking order; the pane's index unless overridden at construction
    fn z_index(&self) -> i32;
    fn opacity(&self) -> f32;
    fn set_opacity(&mut self, opacity: f32);
    fn is_visible(&self) -> bool;
    fn set_visible(&mut self, visible: bool);
    /// Whether pointer events reach the layer
    fn is_interactive(&self) -> bool;

    fn pane(&self) -> Pane {
        self.id().pane()
    }
}
