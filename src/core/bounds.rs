use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in world pixel space, `min` at the top-left
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Rectangle of `size` centred on `center`
    pub fn around(center: Point, size: Point) -> Self {
        let half = size.multiply(0.5);
        Self::new(center.subtract(&half), center.add(&half))
    }

    /// Whole image of `width` x `height` pixels anchored at the origin
    pub fn image(width: f64, height: f64) -> Self {
        Self::new(Point::new(0.0, 0.0), Point::new(width, height))
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn contains(&self, point: &Point) -> bool {
        (self.min.x..=self.max.x).contains(&point.x) && (self.min.y..=self.max.y).contains(&point.y)
    }

    /// Overlapping area; `None` when the rectangles only touch or are apart
    pub fn intersection(&self, other: &Bounds) -> Option<Bounds> {
        let clipped = Bounds::new(
            Point::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            Point::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        );
        (!clipped.is_empty()).then_some(clipped)
    }

    /// Inclusive column and row range of the `tile_size` grid cells this
    /// rectangle covers. Expects non-negative coordinates.
    pub fn tile_range(&self, tile_size: f64) -> Option<((u32, u32), (u32, u32))> {
        if self.is_empty() || tile_size <= 0.0 {
            return None;
        }
        let first = |v: f64| (v / tile_size).floor().max(0.0) as u32;
        let last = |v: f64| ((v / tile_size).ceil() as u32).saturating_sub(1);
        Some((
            (first(self.min.x), last(self.max.x)),
            (first(self.min.y), last(self.max.y)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection() {
        let view = Bounds::around(Point::new(0.0, 0.0), Point::new(200.0, 100.0));
        let image = Bounds::image(400.0, 400.0);
        assert_eq!(
            view.intersection(&image),
            Some(Bounds::new(Point::new(0.0, 0.0), Point::new(100.0, 50.0)))
        );
        let far = Bounds::around(Point::new(-500.0, -500.0), Point::new(10.0, 10.0));
        assert!(far.intersection(&image).is_none());
    }

    #[test]
    fn test_tile_range() {
        let covered = Bounds::new(Point::new(150.0, 0.0), Point::new(400.0, 199.0));
        assert_eq!(covered.tile_range(200.0), Some(((0, 1), (0, 0))));
        assert!(covered.contains(&Point::new(150.0, 199.0)));
        assert_eq!(Bounds::image(0.0, 10.0).tile_range(200.0), None);
    }
}
