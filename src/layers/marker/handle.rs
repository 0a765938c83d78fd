//! Retained visual state of one marker.

use crate::constants::{MARKER_ICON_ANCHOR, MARKER_ICON_SIZE, NO_FRAME_ICON_ANCHOR, NO_FRAME_ICON_SIZE};
use crate::core::geo::LatLng;
use crate::data::marker::{MarkerRecord, MarkerType};
use crate::layers::base::LayerId;
use crate::prelude::HashSet;
use serde::{Deserialize, Serialize};

/// CSS-like state classes a front-end maps to styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualClass {
    /// Fading out before a scheduled detach
    FadeOut,
    /// Collected by the user
    Checked,
    Selected,
}

/// Group a marker handle can live in
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Container {
    Subregion(String),
    /// Aggregation group of one marker type
    Cluster(String),
}

impl Container {
    pub fn layer_id(&self) -> LayerId {
        match self {
            Container::Subregion(id) => LayerId::SubregionGroup(id.clone()),
            Container::Cluster(type_key) => LayerId::ClusterGroup(type_key.clone()),
        }
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self, Container::Cluster(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerVariant {
    Framed,
    NoFrame,
    /// Plain icon plus a permanently open tooltip carrying a badge
    SubIcon,
}

/// Icon as the front-end should draw it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconDescriptor {
    pub url: String,
    pub size: (u32, u32),
    pub anchor: (u32, u32),
    pub framed: bool,
    /// Badge shown in the open tooltip of sub-icon markers
    pub badge_url: Option<String>,
}

/// Item icons; `*_spot` keys live with the marker art
pub fn item_icon_url(host: &str, key: &str) -> String {
    if key.ends_with("_spot") {
        format!("{}/assets/images/marker/{}.png", host, key)
    } else {
        format!("{}/assets/images/item/{}.png", host, key)
    }
}

pub fn sub_icon_url(host: &str, key: &str) -> String {
    format!("{}/assets/images/marker/sub/{}.png", host, key)
}

impl IconDescriptor {
    pub fn for_type(marker_type: &MarkerType, host: &str) -> Self {
        let (size, anchor) = if marker_type.no_frame {
            (NO_FRAME_ICON_SIZE, NO_FRAME_ICON_ANCHOR)
        } else {
            (MARKER_ICON_SIZE, MARKER_ICON_ANCHOR)
        };
        Self {
            url: item_icon_url(host, &marker_type.key),
            size,
            anchor,
            framed: !marker_type.no_frame,
            badge_url: marker_type
                .sub_icon
                .as_deref()
                .map(|sub| sub_icon_url(host, sub)),
        }
    }
}

/// Renderable marker object. Its `parent` is the only record of where it is
/// attached, so it can never sit in two containers at once.
#[derive(Debug, Clone)]
pub struct MarkerHandle {
    id: String,
    type_key: String,
    subregion: String,
    lat_lng: LatLng,
    variant: MarkerVariant,
    icon: IconDescriptor,
    classes: HashSet<VisualClass>,
    parent: Option<Container>,
}

impl MarkerHandle {
    pub fn new(record: &MarkerRecord, marker_type: &MarkerType, host: &str) -> Self {
        let variant = if marker_type.sub_icon.is_some() {
            MarkerVariant::SubIcon
        } else if marker_type.no_frame {
            MarkerVariant::NoFrame
        } else {
            MarkerVariant::Framed
        };
        Self {
            id: record.id.clone(),
            type_key: record.type_key.clone(),
            subregion: record.subregion_id.clone(),
            lat_lng: record.lat_lng(),
            variant,
            icon: IconDescriptor::for_type(marker_type, host),
            classes: HashSet::default(),
            parent: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn type_key(&self) -> &str {
        &self.type_key
    }

    pub fn subregion(&self) -> &str {
        &self.subregion
    }

    pub fn lat_lng(&self) -> LatLng {
        self.lat_lng
    }

    pub fn variant(&self) -> MarkerVariant {
        self.variant
    }

    pub fn icon(&self) -> &IconDescriptor {
        &self.icon
    }

    pub fn parent(&self) -> Option<&Container> {
        self.parent.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.parent.is_some()
    }

    pub(super) fn set_parent(&mut self, parent: Option<Container>) -> Option<Container> {
        std::mem::replace(&mut self.parent, parent)
    }

    pub fn has_class(&self, class: VisualClass) -> bool {
        self.classes.contains(&class)
    }

    pub fn set_class(&mut self, class: VisualClass, on: bool) {
        if on {
            self.classes.insert(class);
        } else {
            self.classes.remove(&class);
        }
    }

    /// Flips a class, returning whether it is now set
    pub fn toggle_class(&mut self, class: VisualClass) -> bool {
        let on = !self.has_class(class);
        self.set_class(class, on);
        on
    }

    pub fn classes(&self) -> impl Iterator<Item = &VisualClass> {
        self.classes.iter()
    }
}
