use crate::core::geo::{LatLng, LatLngBounds};
use serde::{Deserialize, Serialize};

/// Events emitted by the map and consumed by overlays and tools
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// A region switch finished; overlays re-attach their per-region layers
    RegionSwitched { region: String },
    /// A secondary map skin finished loading
    LayerSwitched { layer: String },
    /// Camera center changed
    Move { center: LatLng },
    /// Camera zoom changed
    Zoom { zoom: f64 },
    /// Camera settled after a move
    MoveEnd { center: LatLng },
    /// Camera settled after a zoom
    ZoomEnd { zoom: f64 },
    DragStart,
    DragEnd,
    /// Live feedback while a lasso rectangle is dragged
    LassoHighlight { bounds: LatLngBounds, deselect: bool },
    /// Lasso released; `selected` holds the ids that fell inside
    LassoSelect {
        bounds: LatLngBounds,
        deselect: bool,
        selected: Vec<String>,
    },
    /// Lasso aborted
    LassoClear,
    LabelToolMounted,
    LabelToolUnmounted,
}

/// Discriminant used to register listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    RegionSwitched,
    LayerSwitched,
    Move,
    Zoom,
    MoveEnd,
    ZoomEnd,
    DragStart,
    DragEnd,
    LassoHighlight,
    LassoSelect,
    LassoClear,
    LabelToolMounted,
    LabelToolUnmounted,
}

impl MapEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MapEvent::RegionSwitched { .. } => EventKind::RegionSwitched,
            MapEvent::LayerSwitched { .. } => EventKind::LayerSwitched,
            MapEvent::Move { .. } => EventKind::Move,
            MapEvent::Zoom { .. } => EventKind::Zoom,
            MapEvent::MoveEnd { .. } => EventKind::MoveEnd,
            MapEvent::ZoomEnd { .. } => EventKind::ZoomEnd,
            MapEvent::DragStart => EventKind::DragStart,
            MapEvent::DragEnd => EventKind::DragEnd,
            MapEvent::LassoHighlight { .. } => EventKind::LassoHighlight,
            MapEvent::LassoSelect { .. } => EventKind::LassoSelect,
            MapEvent::LassoClear => EventKind::LassoClear,
            MapEvent::LabelToolMounted => EventKind::LabelToolMounted,
            MapEvent::LabelToolUnmounted => EventKind::LabelToolUnmounted,
        }
    }

    /// Camera settle events trigger a view-state save
    pub fn is_settle(&self) -> bool {
        matches!(self, MapEvent::MoveEnd { .. } | MapEvent::ZoomEnd { .. })
    }
}

/// Lasso gesture phases, as delivered to the marker layer
#[derive(Debug, Clone, PartialEq)]
pub enum LassoEvent {
    Highlight { bounds: LatLngBounds, deselect: bool },
    Select { bounds: LatLngBounds, deselect: bool },
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind() {
        let event = MapEvent::RegionSwitched {
            region: "Valley_4".to_string(),
        };
        assert_eq!(event.kind(), EventKind::RegionSwitched);
        assert!(!event.is_settle());
        assert!(MapEvent::ZoomEnd { zoom: 1.0 }.is_settle());
    }
}
