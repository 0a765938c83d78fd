use crate::core::geo::{LatLng, LatLngBounds, Point};
use serde::{Deserialize, Serialize};

/// Pixel ↔ map coordinate conversion for one region.
///
/// Regions use a flat CRS: at zoom `z` a map coordinate maps to pixels as
/// `x = lng * 2^z`, `y = -lat * 2^z`. Label, link and boundary positions are
/// stored in pixel space at the region's native `max_zoom`, so every overlay
/// converts through the same projection value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Full image size in pixels at `max_zoom`
    pub dimensions: [f64; 2],
    pub max_zoom: u8,
}

impl Projection {
    pub fn new(dimensions: [f64; 2], max_zoom: u8) -> Self {
        Self {
            dimensions,
            max_zoom,
        }
    }

    /// Scale factor for a zoom level
    pub fn scale(zoom: f64) -> f64 {
        2_f64.powf(zoom)
    }

    /// Projects a map coordinate to world pixels at `zoom`
    pub fn project_at(lat_lng: &LatLng, zoom: f64) -> Point {
        let scale = Self::scale(zoom);
        Point::new(lat_lng.lng * scale, -lat_lng.lat * scale)
    }

    /// Unprojects world pixels at `zoom` back to a map coordinate
    pub fn unproject_at(point: &Point, zoom: f64) -> LatLng {
        let scale = Self::scale(zoom);
        LatLng::new(-point.y / scale, point.x / scale)
    }

    /// Region pixel space → map coordinate
    pub fn unproject(&self, point: &Point) -> LatLng {
        Self::unproject_at(point, self.max_zoom as f64)
    }

    /// Map coordinate → region pixel space
    pub fn project(&self, lat_lng: &LatLng) -> Point {
        Self::project_at(lat_lng, self.max_zoom as f64)
    }

    pub fn unproject_xy(&self, xy: [f64; 2]) -> LatLng {
        self.unproject(&Point::from(xy))
    }

    /// Pan limits: the image rectangle `(0,0)`–`dimensions`
    pub fn max_bounds(&self) -> LatLngBounds {
        let [w, h] = self.dimensions;
        LatLngBounds::new(
            self.unproject(&Point::new(0.0, h)),
            self.unproject(&Point::new(w, 0.0)),
        )
    }

    /// Start position: image centre shifted by the region's offset
    pub fn initial_center(&self, offset: Point) -> LatLng {
        let [w, h] = self.dimensions;
        self.unproject(&Point::new(w / 2.0 + offset.x, h / 2.0 + offset.y))
    }

    /// Converts a stored pixel rectangle (two opposite corners) to map bounds
    pub fn unproject_rect(&self, a: [f64; 2], b: [f64; 2]) -> LatLngBounds {
        LatLngBounds::from_corners(self.unproject_xy(a), self.unproject_xy(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unproject_valley_center() {
        let projection = Projection::new([8000.0, 10000.0], 3);
        let center = projection.initial_center(Point::new(750.0, 250.0));
        assert_eq!(center, LatLng::new(-656.25, 593.75));
    }

    #[test]
    fn test_max_bounds_corners() {
        let projection = Projection::new([8000.0, 10000.0], 3);
        let bounds = projection.max_bounds();
        assert_eq!(bounds.south_west, LatLng::new(-1250.0, 0.0));
        assert_eq!(bounds.north_east, LatLng::new(0.0, 1000.0));
        assert_eq!(projection.project(&bounds.south_west), Point::new(0.0, 10000.0));
    }

    #[test]
    fn test_project_round_trip() {
        let projection = Projection::new([4096.0, 4096.0], 4);
        let ll = projection.unproject_xy([100.0, 250.0]);
        assert_eq!(projection.project(&ll), Point::new(100.0, 250.0));
    }
}
