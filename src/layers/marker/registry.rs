//! Marker registry: handles, records, the per-type index and visual groups.

use super::handle::{Container, MarkerHandle};
use crate::core::geo::LatLngBounds;
use crate::data::marker::MarkerRecord;
use crate::prelude::{HashMap, HashSet};
use crate::spatial::index::{SpatialIndex, SpatialItem};

/// Members of one subregion or cluster group
#[derive(Debug, Clone, Default)]
pub struct VisualGroup {
    members: HashSet<String>,
}

impl VisualGroup {
    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = &String> {
        self.members.iter()
    }
}

/// Entries are never removed; only their attachment changes
#[derive(Debug, Default)]
pub struct MarkerRegistry {
    markers: HashMap<String, MarkerHandle>,
    records: HashMap<String, MarkerRecord>,
    type_map: HashMap<String, Vec<String>>,
    groups: HashMap<Container, VisualGroup>,
    order: Vec<String>,
    positions: SpatialIndex<()>,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes a record and its handle. Returns `false` if the id is already known.
    pub fn insert(&mut self, record: MarkerRecord, handle: MarkerHandle) -> bool {
        if self.records.contains_key(&record.id) {
            return false;
        }
        let id = record.id.clone();
        self.positions
            .insert(SpatialItem::from_lat_lng(id.clone(), record.lat_lng(), ()));
        self.type_map
            .entry(record.type_key.clone())
            .or_default()
            .push(id.clone());
        self.markers.insert(id.clone(), handle);
        self.records.insert(id.clone(), record);
        self.order.push(id);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.markers.contains_key(id)
    }

    pub fn handle(&self, id: &str) -> Option<&MarkerHandle> {
        self.markers.get(id)
    }

    pub fn handle_mut(&mut self, id: &str) -> Option<&mut MarkerHandle> {
        self.markers.get_mut(id)
    }

    pub fn record(&self, id: &str) -> Option<&MarkerRecord> {
        self.records.get(id)
    }

    /// Ids of a type in import order
    pub fn ids_of_type(&self, type_key: &str) -> &[String] {
        self.type_map
            .get(type_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every id in import order
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn handles(&self) -> impl Iterator<Item = &MarkerHandle> {
        self.order.iter().filter_map(|id| self.markers.get(id))
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn ensure_group(&mut self, container: Container) -> &mut VisualGroup {
        self.groups.entry(container).or_default()
    }

    pub fn group(&self, container: &Container) -> Option<&VisualGroup> {
        self.groups.get(container)
    }

    pub fn member_count(&self, container: &Container) -> usize {
        self.groups.get(container).map_or(0, VisualGroup::len)
    }

    /// Ids currently in a group, sorted
    pub fn members_of(&self, container: &Container) -> Vec<String> {
        let mut members: Vec<String> = self
            .groups
            .get(container)
            .map(|group| group.members().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    pub fn subregion_groups(&self) -> impl Iterator<Item = &Container> {
        self.groups
            .keys()
            .filter(|container| matches!(container, Container::Subregion(_)))
    }

    /// Moves a handle into `parent` (or detaches it), keeping group membership
    /// in step. Returns `true` if anything changed.
    pub fn set_parent(&mut self, id: &str, parent: Option<Container>) -> bool {
        let Some(handle) = self.markers.get_mut(id) else {
            return false;
        };
        if handle.parent() == parent.as_ref() {
            return false;
        }
        let previous = handle.set_parent(parent.clone());
        if let Some(previous) = previous {
            if let Some(group) = self.groups.get_mut(&previous) {
                group.members.remove(id);
            }
        }
        if let Some(parent) = parent {
            self.groups
                .entry(parent)
                .or_default()
                .members
                .insert(id.to_string());
        }
        true
    }

    /// Ids whose position lies inside `bounds`
    pub fn ids_in_bounds(&self, bounds: &LatLngBounds) -> Vec<String> {
        self.positions
            .query(bounds)
            .into_iter()
            .map(|item| item.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::marker::MarkerType;

    fn insert(registry: &mut MarkerRegistry, id: &str, lat: f64) -> bool {
        let record = MarkerRecord::new(id, [lat, 10.0], "A", "ore");
        let handle = MarkerHandle::new(&record, &MarkerType::new("ore", "resource", "ore"), "");
        registry.insert(record, handle)
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut registry = MarkerRegistry::new();
        assert!(insert(&mut registry, "m1", -1.0));
        assert!(!insert(&mut registry, "m1", -1.0));
        assert_eq!(registry.ids_of_type("ore"), &["m1".to_string()]);
        assert_eq!(registry.len(), 1);
        assert!(registry.record("m1").is_some());
    }

    #[test]
    fn test_set_parent_moves_membership() {
        let mut registry = MarkerRegistry::new();
        insert(&mut registry, "m1", -1.0);
        let plain = Container::Subregion("A".into());
        let cluster = Container::Cluster("ore".into());

        assert!(registry.set_parent("m1", Some(plain.clone())));
        assert!(!registry.set_parent("m1", Some(plain.clone())));
        assert_eq!(registry.member_count(&plain), 1);

        registry.set_parent("m1", Some(cluster.clone()));
        assert_eq!(registry.member_count(&plain), 0);
        assert_eq!(registry.member_count(&cluster), 1);

        registry.set_parent("m1", None);
        assert_eq!(registry.member_count(&cluster), 0);
        assert!(!registry.handle("m1").unwrap().is_attached());
    }

    #[test]
    fn test_ids_in_bounds() {
        let mut registry = MarkerRegistry::new();
        insert(&mut registry, "in", -5.0);
        insert(&mut registry, "out", -50.0);
        let ids = registry.ids_in_bounds(&LatLngBounds::from_coords(-10.0, 0.0, 0.0, 20.0));
        assert_eq!(ids, vec!["in".to_string()]);
    }
}
