use crate::core::bounds::Bounds;
use crate::core::geo::{LatLng, LatLngBounds, Point};
use crate::core::projection::Projection;
use serde::{Deserialize, Serialize};

/// Manages the current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in map coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
    /// Zoom levels are rounded to multiples of this value (0 disables snapping)
    pub zoom_snap: f64,
    /// Pan limits; the center never leaves these bounds
    max_bounds: Option<LatLngBounds>,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self {
            center,
            zoom,
            size,
            min_zoom: 0.0,
            max_zoom: f64::INFINITY,
            zoom_snap: 0.0,
            max_bounds: None,
        }
    }

    /// Sets the maximum bounds for the map and re-clamps the center
    pub fn set_max_bounds(&mut self, bounds: Option<LatLngBounds>) {
        self.max_bounds = bounds;
        self.center = self.clamp_center(self.center);
    }

    /// Get the maximum bounds for the map if set
    pub fn max_bounds(&self) -> Option<&LatLngBounds> {
        self.max_bounds.as_ref()
    }

    /// Sets the center of the viewport with bounds checking
    pub fn set_center(&mut self, center: LatLng) {
        self.center = self.clamp_center(center);
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = self.clamp_zoom(zoom);
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    /// Sets the zoom limits. A minimum above the maximum is lowered to it.
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        let min_zoom = min_zoom.min(max_zoom);
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
    }

    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Rounds a zoom to the configured snap step
    pub fn snap_zoom(&self, zoom: f64) -> f64 {
        if self.zoom_snap > 0.0 {
            (zoom / self.zoom_snap).round() * self.zoom_snap
        } else {
            zoom
        }
    }

    /// Gets the scale factor for the current zoom level
    pub fn scale(&self) -> f64 {
        Projection::scale(self.zoom)
    }

    /// Projects a map coordinate to world pixels at the given zoom (current zoom if `None`)
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        Projection::project_at(lat_lng, zoom.unwrap_or(self.zoom))
    }

    /// Unprojects world pixels at the given zoom (current zoom if `None`)
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        Projection::unproject_at(pixel, zoom.unwrap_or(self.zoom))
    }

    /// World pixel of the top-left corner of the viewport
    pub fn pixel_origin(&self) -> Point {
        self.project(&self.center, None)
            .subtract(&self.size.multiply(0.5))
    }

    /// Converts a map coordinate to screen pixel coordinates (container relative)
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        self.project(lat_lng, None).subtract(&self.pixel_origin())
    }

    /// Converts screen pixel coordinates back to map coordinates
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        self.unproject(&pixel.add(&self.pixel_origin()), None)
    }

    /// World pixel rectangle covered by the viewport at the current zoom
    pub fn pixel_bounds(&self) -> Bounds {
        let center = self.project(&self.center, None);
        Bounds::around(center, self.size)
    }

    /// Gets the current viewport bounds in map coordinates
    pub fn bounds(&self) -> LatLngBounds {
        let nw = self.pixel_to_lat_lng(&Point::new(0.0, 0.0));
        let se = self.pixel_to_lat_lng(&self.size);
        LatLngBounds::from_corners(nw, se)
    }

    /// Pans the viewport by the given screen offset and returns the offset that was applied
    pub fn pan(&mut self, delta: Point) -> Point {
        let before = self.project(&self.center, None);
        let target = self.unproject(&before.add(&delta), None);
        self.set_center(target);
        self.project(&self.center, None).subtract(&before)
    }

    /// Zooms the viewport to a level, keeping `focus_point` (screen pixels) stationary if given
    pub fn zoom_to(&mut self, zoom: f64, focus_point: Option<Point>) {
        let new_zoom = self.clamp_zoom(zoom);
        if (new_zoom - self.zoom).abs() < 1e-9 {
            return;
        }

        match focus_point {
            Some(focus) => {
                let focus_lat_lng = self.pixel_to_lat_lng(&focus);
                self.zoom = new_zoom;
                let drifted = self.lat_lng_to_pixel(&focus_lat_lng);
                self.pan(drifted.subtract(&focus));
            }
            None => self.zoom = new_zoom,
        }
    }

    fn clamp_center(&self, center: LatLng) -> LatLng {
        match &self.max_bounds {
            Some(bounds) => bounds.clamp(&center),
            None => center,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 0.0, Point::new(1280.0, 720.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_limits() {
        let mut viewport = Viewport::default();
        viewport.set_zoom_limits(0.0, 4.0);

        viewport.set_zoom(-1.0);
        assert_eq!(viewport.zoom, 0.0);

        viewport.set_zoom(9.0);
        assert_eq!(viewport.zoom, 4.0);
    }

    #[test]
    fn test_inverted_zoom_limits_collapse() {
        let mut viewport = Viewport::default();
        viewport.set_zoom_limits(6.0, 4.0);
        viewport.set_zoom(5.0);
        assert_eq!(viewport.zoom, 4.0);
        assert_eq!(viewport.clamp_zoom(0.0), 4.0);
    }

    #[test]
    fn test_coordinate_conversion() {
        let viewport = Viewport::new(LatLng::new(-100.0, 100.0), 1.0, Point::new(512.0, 512.0));
        let center = viewport.pixel_to_lat_lng(&Point::new(256.0, 256.0));
        assert_eq!(center, LatLng::new(-100.0, 100.0));
        assert_eq!(
            viewport.lat_lng_to_pixel(&LatLng::new(-100.0, 110.0)),
            Point::new(276.0, 256.0)
        );
    }

    #[test]
    fn test_pan_is_clamped_to_max_bounds() {
        let mut viewport = Viewport::new(LatLng::new(-50.0, 50.0), 0.0, Point::new(100.0, 100.0));
        viewport.set_max_bounds(Some(LatLngBounds::from_coords(-100.0, 0.0, 0.0, 100.0)));

        let applied = viewport.pan(Point::new(500.0, 0.0));
        assert_eq!(viewport.center, LatLng::new(-50.0, 100.0));
        assert_eq!(applied, Point::new(50.0, 0.0));
    }

    #[test]
    fn test_zoom_around_focus_keeps_point_fixed() {
        let mut viewport = Viewport::new(LatLng::new(-50.0, 50.0), 0.0, Point::new(100.0, 100.0));
        viewport.set_zoom_limits(0.0, 3.0);
        let focus = Point::new(75.0, 25.0);
        let before = viewport.pixel_to_lat_lng(&focus);

        viewport.zoom_to(2.0, Some(focus));

        let after = viewport.lat_lng_to_pixel(&before);
        assert!((after.x - focus.x).abs() < 1e-9);
        assert!((after.y - focus.y).abs() < 1e-9);
    }

    #[test]
    fn test_snap_zoom() {
        let mut viewport = Viewport::default();
        viewport.zoom_snap = 0.25;
        assert_eq!(viewport.snap_zoom(1.3), 1.25);
        assert_eq!(viewport.snap_zoom(1.4), 1.5);
    }
}
