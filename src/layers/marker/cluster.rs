//! Per-type aggregation groups for cluster-eligible marker types.
//!
//! Membership is diffed on every filter or subregion change instead of
//! rebuilt, so groups whose type did not change keep their members and icon.
//! Removals fade out first and detach once the shared fade delay elapses.

use super::handle::{Container, IconDescriptor, VisualClass};
use super::registry::MarkerRegistry;
use crate::animation::FadeScheduler;
use crate::core::projection::Projection;
use crate::data::marker::MarkerTypeCatalog;
use crate::layers::manager::LayerManager;
use crate::prelude::HashSet;
use crate::spatial::clustering::{grid_cluster, Cluster, ClusteringConfig};
use std::collections::BTreeMap;
use std::time::Duration;

/// Icon of an aggregation group: the type's thumbnail and its live member count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterIcon {
    pub type_key: String,
    pub icon: IconDescriptor,
    pub count: usize,
}

/// Result of one diff pass over a type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClusterDiff {
    pub added: usize,
    pub removed: usize,
    pub restored: usize,
}

#[derive(Debug)]
pub struct ClusterLayer {
    icons: BTreeMap<String, IconDescriptor>,
    enabled: bool,
    filter: HashSet<String>,
    active_subregions: HashSet<String>,
    excluded: HashSet<String>,
    removals: FadeScheduler<String, String>,
    config: ClusteringConfig,
}

impl ClusterLayer {
    pub fn new(catalog: &MarkerTypeCatalog, asset_host: &str, fade_delay: Duration) -> Self {
        let icons = catalog
            .cluster_eligible_types()
            .map(|t| (t.key.clone(), IconDescriptor::for_type(t, asset_host)))
            .collect();
        Self {
            icons,
            enabled: false,
            filter: HashSet::default(),
            active_subregions: HashSet::default(),
            excluded: HashSet::default(),
            removals: FadeScheduler::new(fade_delay),
            config: ClusteringConfig::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_managed(&self, type_key: &str) -> bool {
        self.icons.contains_key(type_key)
    }

    pub fn managed_types(&self) -> impl Iterator<Item = &str> {
        self.icons.keys().map(String::as_str)
    }

    pub fn is_pending_removal(&self, id: &str) -> bool {
        self.removals.is_pending(&id.to_string())
    }

    pub fn pending_removals(&self) -> usize {
        self.removals.len()
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Pulls every member out of its group at once and detaches all groups
    pub fn disable(&mut self, registry: &mut MarkerRegistry, layers: &mut LayerManager) {
        self.enabled = false;
        self.removals.clear();
        for type_key in self.icons.keys() {
            let container = Container::Cluster(type_key.clone());
            for id in registry.members_of(&container) {
                registry.set_parent(&id, None);
                if let Some(handle) = registry.handle_mut(&id) {
                    handle.set_class(VisualClass::FadeOut, false);
                }
            }
            layers.detach(&container.layer_id());
        }
    }

    /// Ids kept out of every group (collected markers while hiding completed)
    pub fn set_excluded(&mut self, excluded: HashSet<String>) {
        self.excluded = excluded;
    }

    pub fn set_active_subregions<I, S>(
        &mut self,
        subregions: I,
        registry: &mut MarkerRegistry,
        layers: &mut LayerManager,
        now: Duration,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_subregions = subregions.into_iter().map(Into::into).collect();
        let evicted = self.evict_inactive(registry);
        if evicted > 0 {
            log::debug!("dropped {} cluster members outside the active subregions", evicted);
        }
        if self.enabled {
            self.refresh(registry, layers, now);
        }
    }

    /// Removes members of inactive subregions without a fade. Their layers
    /// belong to the previous region and are already gone.
    fn evict_inactive(&mut self, registry: &mut MarkerRegistry) -> usize {
        let mut evicted = 0;
        for type_key in self.icons.keys() {
            let container = Container::Cluster(type_key.clone());
            for id in registry.members_of(&container) {
                let active = registry
                    .record(&id)
                    .map_or(false, |record| self.active_subregions.contains(&record.subregion_id));
                if active {
                    continue;
                }
                self.removals.cancel(&id);
                registry.set_parent(&id, None);
                if let Some(handle) = registry.handle_mut(&id) {
                    handle.set_class(VisualClass::FadeOut, false);
                }
                evicted += 1;
            }
        }
        evicted
    }

    /// Records the filter and, when enabled, diffs every managed type
    pub fn apply_filter(
        &mut self,
        filter: &HashSet<String>,
        registry: &mut MarkerRegistry,
        layers: &mut LayerManager,
        now: Duration,
    ) -> ClusterDiff {
        self.filter = filter.clone();
        if !self.enabled {
            return ClusterDiff::default();
        }
        self.refresh(registry, layers, now)
    }

    /// Re-runs the diff with the last filter
    pub fn refresh(
        &mut self,
        registry: &mut MarkerRegistry,
        layers: &mut LayerManager,
        now: Duration,
    ) -> ClusterDiff {
        let types: Vec<String> = self.icons.keys().cloned().collect();
        let mut total = ClusterDiff::default();
        for type_key in types {
            let diff = self.refresh_type(&type_key, registry, layers, now);
            total.added += diff.added;
            total.removed += diff.removed;
            total.restored += diff.restored;
        }
        log::debug!(
            "cluster diff: +{} -{} restored {}",
            total.added,
            total.removed,
            total.restored
        );
        total
    }

    fn desired(&self, type_key: &str, registry: &MarkerRegistry) -> Vec<String> {
        if !self.filter.contains(type_key) {
            return Vec::new();
        }
        registry
            .ids_of_type(type_key)
            .iter()
            .filter(|id| !self.excluded.contains(*id))
            .filter(|id| {
                registry
                    .record(id)
                    .map_or(false, |record| self.active_subregions.contains(&record.subregion_id))
            })
            .cloned()
            .collect()
    }

    fn refresh_type(
        &mut self,
        type_key: &str,
        registry: &mut MarkerRegistry,
        layers: &mut LayerManager,
        now: Duration,
    ) -> ClusterDiff {
        let container = Container::Cluster(type_key.to_string());
        let desired = self.desired(type_key, registry);
        let desired_set: HashSet<&String> = desired.iter().collect();
        let current = registry.members_of(&container);
        let mut diff = ClusterDiff::default();

        for id in &desired {
            let resident = registry
                .group(&container)
                .map_or(false, |group| group.contains(id));
            if resident {
                if self.removals.cancel(id).is_some() {
                    if let Some(handle) = registry.handle_mut(id) {
                        handle.set_class(VisualClass::FadeOut, false);
                    }
                    diff.restored += 1;
                }
            } else {
                registry.set_parent(id, Some(container.clone()));
                diff.added += 1;
            }
        }

        for id in current {
            if desired_set.contains(&id) || self.removals.is_pending(&id) {
                continue;
            }
            if let Some(handle) = registry.handle_mut(&id) {
                handle.set_class(VisualClass::FadeOut, true);
            }
            self.removals.schedule(id, type_key.to_string(), now);
            diff.removed += 1;
        }

        self.sync_attachment(&container, registry, layers);
        diff
    }

    fn sync_attachment(&self, container: &Container, registry: &MarkerRegistry, layers: &mut LayerManager) {
        let id = container.layer_id();
        if self.enabled && registry.member_count(container) > 0 {
            layers.attach(id);
        } else {
            layers.detach(&id);
        }
    }

    /// Adds freshly imported ids straight into their groups without a full diff
    pub fn notify_markers_added(
        &mut self,
        ids: &[String],
        registry: &mut MarkerRegistry,
        layers: &mut LayerManager,
    ) -> usize {
        if !self.enabled || self.filter.is_empty() {
            return 0;
        }
        let mut touched: HashSet<String> = HashSet::default();
        for id in ids {
            let Some(record) = registry.record(id) else {
                continue;
            };
            let type_key = record.type_key.clone();
            if !self.is_managed(&type_key)
                || !self.filter.contains(&type_key)
                || !self.active_subregions.contains(&record.subregion_id)
                || self.excluded.contains(id)
            {
                continue;
            }
            registry.set_parent(id, Some(Container::Cluster(type_key.clone())));
            touched.insert(type_key);
        }
        for type_key in &touched {
            self.sync_attachment(&Container::Cluster(type_key.clone()), registry, layers);
        }
        touched.len()
    }

    /// Fires due removals; a removal only detaches a marker still in the group it was scheduled from
    pub fn tick(&mut self, registry: &mut MarkerRegistry, layers: &mut LayerManager, now: Duration) -> usize {
        let due = self.removals.take_due(now);
        let mut fired = 0;
        let mut touched: HashSet<String> = HashSet::default();
        for (id, type_key) in due {
            let container = Container::Cluster(type_key.clone());
            let still_resident = registry
                .handle(&id)
                .map_or(false, |handle| handle.parent() == Some(&container));
            if !still_resident {
                continue;
            }
            registry.set_parent(&id, None);
            if let Some(handle) = registry.handle_mut(&id) {
                handle.set_class(VisualClass::FadeOut, false);
            }
            touched.insert(type_key);
            fired += 1;
        }
        for type_key in touched {
            self.sync_attachment(&Container::Cluster(type_key), registry, layers);
        }
        fired
    }

    /// Live member count of a type's group
    pub fn child_count(&self, type_key: &str, registry: &MarkerRegistry) -> usize {
        registry.member_count(&Container::Cluster(type_key.to_string()))
    }

    pub fn group_icon(&self, type_key: &str, registry: &MarkerRegistry) -> Option<ClusterIcon> {
        let icon = self.icons.get(type_key)?;
        Some(ClusterIcon {
            type_key: type_key.to_string(),
            icon: icon.clone(),
            count: self.child_count(type_key, registry),
        })
    }

    /// On-screen bubbles for one group at `zoom`
    pub fn bubbles(&self, type_key: &str, zoom: f64, registry: &MarkerRegistry) -> Vec<Cluster> {
        let container = Container::Cluster(type_key.to_string());
        let items: Vec<_> = registry
            .members_of(&container)
            .into_iter()
            .filter_map(|id| {
                let handle = registry.handle(&id)?;
                Some((id, Projection::project_at(&handle.lat_lng(), zoom)))
            })
            .collect();
        grid_cluster(&self.config, &items, zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::marker::{MarkerRecord, MarkerType};
    use crate::layers::base::LayerId;
    use crate::layers::marker::handle::MarkerHandle;

    const FADE: Duration = Duration::from_millis(160);

    fn setup(n: usize) -> (ClusterLayer, MarkerRegistry, LayerManager) {
        let mut catalog = MarkerTypeCatalog::new();
        let ore = MarkerType::new("originium_ore", "resource", "ore");
        catalog.insert(ore.clone());
        catalog.insert(MarkerType::new("chest", "collection", "box"));

        let mut registry = MarkerRegistry::new();
        for i in 0..n {
            let record = MarkerRecord::new(format!("ore{}", i), [-(i as f64), 1.0], "Valley_4", "originium_ore");
            let handle = MarkerHandle::new(&record, &ore, "");
            registry.insert(record, handle);
        }
        let mut layer = ClusterLayer::new(&catalog, "", FADE);
        let mut layers = LayerManager::new();
        layer.enable();
        layer.set_active_subregions(["Valley_4"], &mut registry, &mut layers, Duration::ZERO);
        (layer, registry, layers)
    }

    fn filter(types: &[&str]) -> HashSet<String> {
        types.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_only_eligible_types_are_managed() {
        let (layer, _, _) = setup(0);
        assert!(layer.is_managed("originium_ore"));
        assert!(!layer.is_managed("chest"));
    }

    #[test]
    fn test_apply_filter_adds_and_attaches() {
        let (mut layer, mut registry, mut layers) = setup(5);
        let diff = layer.apply_filter(&filter(&["originium_ore"]), &mut registry, &mut layers, Duration::ZERO);
        assert_eq!(diff.added, 5);
        assert_eq!(layer.child_count("originium_ore", &registry), 5);
        assert!(layers.is_attached(&LayerId::ClusterGroup("originium_ore".into())));
        assert_eq!(layer.group_icon("originium_ore", &registry).unwrap().count, 5);
    }

    #[test]
    fn test_removal_fades_then_detaches_group() {
        let (mut layer, mut registry, mut layers) = setup(2);
        layer.apply_filter(&filter(&["originium_ore"]), &mut registry, &mut layers, Duration::ZERO);
        let diff = layer.apply_filter(&filter(&[]), &mut registry, &mut layers, Duration::ZERO);
        assert_eq!(diff.removed, 2);
        assert!(registry.handle("ore0").unwrap().has_class(VisualClass::FadeOut));
        assert_eq!(layer.child_count("originium_ore", &registry), 2);

        assert_eq!(layer.tick(&mut registry, &mut layers, Duration::from_millis(100)), 0);
        assert_eq!(layer.tick(&mut registry, &mut layers, FADE), 2);
        assert_eq!(layer.child_count("originium_ore", &registry), 0);
        assert!(!layers.is_attached(&LayerId::ClusterGroup("originium_ore".into())));
        assert!(!registry.handle("ore0").unwrap().has_class(VisualClass::FadeOut));
    }

    #[test]
    fn test_reapply_before_timer_restores_members() {
        let (mut layer, mut registry, mut layers) = setup(3);
        let ore = filter(&["originium_ore"]);
        layer.apply_filter(&ore, &mut registry, &mut layers, Duration::ZERO);
        layer.apply_filter(&filter(&[]), &mut registry, &mut layers, Duration::ZERO);
        let diff = layer.apply_filter(&ore, &mut registry, &mut layers, Duration::from_millis(50));
        assert_eq!(diff.restored, 3);
        assert_eq!(diff.added, 0);
        assert_eq!(layer.tick(&mut registry, &mut layers, Duration::from_millis(500)), 0);
        assert_eq!(layer.child_count("originium_ore", &registry), 3);
    }

    #[test]
    fn test_bubbles_merge_below_threshold() {
        let (mut layer, mut registry, mut layers) = setup(4);
        layer.apply_filter(&filter(&["originium_ore"]), &mut registry, &mut layers, Duration::ZERO);
        let merged = layer.bubbles("originium_ore", 0.0, &registry);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].count(), 4);
        let split = layer.bubbles("originium_ore", 6.0, &registry);
        assert_eq!(split.len(), 4);
    }

    #[test]
    fn test_disable_detaches_everything() {
        let (mut layer, mut registry, mut layers) = setup(2);
        layer.apply_filter(&filter(&["originium_ore"]), &mut registry, &mut layers, Duration::ZERO);
        layer.disable(&mut registry, &mut layers);
        assert!(!layer.is_enabled());
        assert_eq!(layer.child_count("originium_ore", &registry), 0);
        assert!(layers.is_empty());
    }

    #[test]
    fn test_switching_subregions_drops_previous_members_at_once() {
        let (mut layer, mut registry, mut layers) = setup(3);
        let ore = MarkerType::new("originium_ore", "resource", "ore");
        for i in 0..2 {
            let record = MarkerRecord::new(format!("w{}", i), [-10.0, i as f64], "Wuling_1", "originium_ore");
            let handle = MarkerHandle::new(&record, &ore, "");
            registry.insert(record, handle);
        }
        layer.apply_filter(&filter(&["originium_ore"]), &mut registry, &mut layers, Duration::ZERO);
        assert_eq!(layer.child_count("originium_ore", &registry), 3);

        layer.set_active_subregions(["Wuling_1"], &mut registry, &mut layers, Duration::from_millis(10));
        let mut members = registry.members_of(&Container::Cluster("originium_ore".into()));
        members.sort();
        assert_eq!(members, vec!["w0".to_string(), "w1".to_string()]);
        assert_eq!(layer.group_icon("originium_ore", &registry).unwrap().count, 2);
        assert_eq!(layer.pending_removals(), 0);
        assert!(!registry.handle("ore0").unwrap().has_class(VisualClass::FadeOut));
        assert!(layers.is_attached(&LayerId::ClusterGroup("originium_ore".into())));
    }

    #[test]
    fn test_switching_cancels_fades_of_previous_members() {
        let (mut layer, mut registry, mut layers) = setup(2);
        layer.apply_filter(&filter(&["originium_ore"]), &mut registry, &mut layers, Duration::ZERO);
        layer.apply_filter(&filter(&[]), &mut registry, &mut layers, Duration::ZERO);
        assert_eq!(layer.pending_removals(), 2);

        layer.set_active_subregions(["Wuling_1"], &mut registry, &mut layers, Duration::from_millis(20));
        assert_eq!(layer.pending_removals(), 0);
        assert_eq!(layer.child_count("originium_ore", &registry), 0);
        assert!(!layers.is_attached(&LayerId::ClusterGroup("originium_ore".into())));
        assert_eq!(layer.tick(&mut registry, &mut layers, FADE), 0);
    }
}
