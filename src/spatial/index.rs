use crate::core::geo::{LatLng, LatLngBounds, Point};

use rstar::{RTree, RTreeObject, AABB};

/// A point item that can be indexed via an R-tree
#[derive(Debug, Clone)]
pub struct SpatialItem<T> {
    pub id: String,
    /// Position as `(x = lng, y = lat)`
    pub point: Point,
    pub data: T,
}

impl<T> SpatialItem<T> {
    pub fn new(id: String, point: Point, data: T) -> Self {
        Self { id, point, data }
    }

    pub fn from_lat_lng(id: String, lat_lng: LatLng, data: T) -> Self {
        Self::new(id, Point::new(lat_lng.lng, lat_lng.lat), data)
    }
}

impl<T> PartialEq for SpatialItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for SpatialItem<T> {}

// --- rstar integration -------------------------------------------------------------------------

impl<T> RTreeObject for SpatialItem<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.point.x, self.point.y])
    }
}

/// R-tree over marker positions, used for lasso rectangle queries
pub struct SpatialIndex<T> {
    rtree: RTree<SpatialItem<T>>,
}

impl<T> std::fmt::Debug for SpatialIndex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("len", &self.rtree.size())
            .finish()
    }
}

impl<T> SpatialIndex<T> {
    pub fn new() -> Self {
        Self {
            rtree: RTree::new(),
        }
    }

    pub fn insert(&mut self, item: SpatialItem<T>) {
        self.rtree.insert(item);
    }

    /// Items whose position lies inside `bounds` (edges inclusive)
    pub fn query(&self, bounds: &LatLngBounds) -> Vec<&SpatialItem<T>> {
        let envelope = AABB::from_corners(
            [bounds.south_west.lng, bounds.south_west.lat],
            [bounds.north_east.lng, bounds.north_east.lat],
        );
        self.rtree.locate_in_envelope(&envelope).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn clear(&mut self) {
        self.rtree = RTree::new();
    }
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> SpatialIndex<()> {
        let mut index = SpatialIndex::new();
        index.insert(SpatialItem::from_lat_lng("a".into(), LatLng::new(-10.0, 10.0), ()));
        index.insert(SpatialItem::from_lat_lng("b".into(), LatLng::new(-50.0, 50.0), ()));
        index.insert(SpatialItem::from_lat_lng("c".into(), LatLng::new(-12.0, 11.0), ()));
        index
    }

    #[test]
    fn test_rectangle_query() {
        let index = index();
        let mut ids: Vec<_> = index
            .query(&LatLngBounds::from_coords(-20.0, 0.0, 0.0, 20.0))
            .into_iter()
            .map(|item| item.id.clone())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(index.len(), 3);
    }
}
