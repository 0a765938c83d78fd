//! Subregion outlines used for boundaries, highlights and hit-testing.

use crate::core::geo::{LatLng, LatLngBounds};
use crate::core::projection::Projection;
use crate::prelude::HashMap;
use crate::Result;
use ::geo::Contains;
use geo_types::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Outline of one subregion in region pixel space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubregionArea {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Two opposite corners `[[x1, y1], [x2, y2]]`
    #[serde(default)]
    pub bounds: Vec<[f64; 2]>,
    /// Rings of `[x, y]`; the first ring is the outline, the rest are holes
    #[serde(default)]
    pub polygon: Vec<Vec<[f64; 2]>>,
}

/// Outline converted to map coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum AreaShape {
    Polygon(Vec<Vec<LatLng>>),
    Rectangle(LatLngBounds),
}

impl AreaShape {
    pub fn bounds(&self) -> Option<LatLngBounds> {
        match self {
            AreaShape::Rectangle(bounds) => Some(bounds.clone()),
            AreaShape::Polygon(rings) => {
                let mut points = rings.iter().flatten();
                let first = points.next()?;
                let mut bounds = LatLngBounds::new(*first, *first);
                for point in points {
                    bounds.extend(point);
                }
                Some(bounds)
            }
        }
    }

    /// Point-in-shape test; polygon holes are excluded
    pub fn contains(&self, point: &LatLng) -> bool {
        match self {
            AreaShape::Rectangle(bounds) => bounds.contains(point),
            AreaShape::Polygon(rings) => {
                let mut rings = rings.iter().map(|ring| {
                    LineString::from(
                        ring.iter()
                            .map(|p| Coord { x: p.lng, y: p.lat })
                            .collect::<Vec<_>>(),
                    )
                });
                let Some(exterior) = rings.next() else {
                    return false;
                };
                let polygon = Polygon::new(exterior, rings.collect());
                polygon.contains(&geo_types::Point::new(point.lng, point.lat))
            }
        }
    }
}

impl SubregionArea {
    /// Polygon when present, otherwise the rectangle
    pub fn shape(&self, projection: &Projection) -> Option<AreaShape> {
        if self.polygon.iter().any(|ring| !ring.is_empty()) {
            let rings = self
                .polygon
                .iter()
                .filter(|ring| !ring.is_empty())
                .map(|ring| ring.iter().map(|xy| projection.unproject_xy(*xy)).collect())
                .collect();
            return Some(AreaShape::Polygon(rings));
        }
        match self.bounds.as_slice() {
            [a, b, ..] => Some(AreaShape::Rectangle(projection.unproject_rect(*a, *b))),
            _ => None,
        }
    }

    pub fn center(&self, projection: &Projection) -> Option<LatLng> {
        self.shape(projection)
            .and_then(|shape| shape.bounds())
            .map(|bounds| bounds.center())
    }
}

/// Subregion outlines keyed by id
#[derive(Debug, Clone, Default)]
pub struct SubregionCatalog {
    areas: HashMap<String, SubregionArea>,
}

impl SubregionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON array of areas; later entries replace earlier ones
    pub fn from_json_str(json: &str) -> Result<Self> {
        let areas: Vec<SubregionArea> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        catalog.extend(areas);
        Ok(catalog)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn extend(&mut self, areas: impl IntoIterator<Item = SubregionArea>) {
        for area in areas {
            self.areas.insert(area.id.clone(), area);
        }
    }

    pub fn get(&self, id: &str) -> Option<&SubregionArea> {
        self.areas.get(id)
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}
