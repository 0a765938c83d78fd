//! Marker layer: registry owner and visibility controller.
//!
//! A marker is shown when its type is in the filter and it is not hidden as
//! completed. Markers of cluster-eligible types are handed to the
//! [`ClusterLayer`] while clustering is on and never sit in a subregion group
//! at the same time. Hiding is two-step: the marker gets [`VisualClass::FadeOut`]
//! and is detached when its fade delay elapses, unless it is shown again first.

use super::cluster::ClusterLayer;
use super::handle::{Container, MarkerHandle, VisualClass};
use super::lasso::LassoSelection;
use super::registry::MarkerRegistry;
use crate::animation::FadeScheduler;
use crate::core::clock::Clock;
use crate::core::config::Region;
use crate::core::geo::LatLngBounds;
use crate::data::marker::{MarkerRecord, MarkerTypeCatalog};
use crate::input::events::LassoEvent;
use crate::layers::base::LayerId;
use crate::layers::manager::LayerManager;
use crate::prelude::{Arc, HashSet};
use std::time::Duration;

pub struct MarkerLayer {
    registry: MarkerRegistry,
    cluster: ClusterLayer,
    catalog: Arc<MarkerTypeCatalog>,
    clock: Arc<dyn Clock>,
    removals: FadeScheduler<String, Container>,
    asset_host: String,
    filter: Vec<String>,
    filter_set: HashSet<String>,
    collected: HashSet<String>,
    selected: HashSet<String>,
    hide_completed: bool,
    active_subregions: Vec<String>,
    lasso: LassoSelection,
}

impl std::fmt::Debug for MarkerLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerLayer")
            .field("markers", &self.registry.len())
            .field("filter", &self.filter)
            .field("clustering", &self.cluster.is_enabled())
            .field("hide_completed", &self.hide_completed)
            .field("active_subregions", &self.active_subregions)
            .finish()
    }
}

impl MarkerLayer {
    pub fn new(
        catalog: Arc<MarkerTypeCatalog>,
        clock: Arc<dyn Clock>,
        asset_host: impl Into<String>,
        fade_delay: Duration,
    ) -> Self {
        let asset_host = asset_host.into();
        Self {
            registry: MarkerRegistry::new(),
            cluster: ClusterLayer::new(&catalog, &asset_host, fade_delay),
            catalog,
            clock,
            removals: FadeScheduler::new(fade_delay),
            asset_host,
            filter: Vec::new(),
            filter_set: HashSet::default(),
            collected: HashSet::default(),
            selected: HashSet::default(),
            hide_completed: false,
            active_subregions: Vec::new(),
            lasso: LassoSelection::new(),
        }
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    pub fn cluster(&self) -> &ClusterLayer {
        &self.cluster
    }

    pub fn catalog(&self) -> &MarkerTypeCatalog {
        &self.catalog
    }

    pub fn handle(&self, id: &str) -> Option<&MarkerHandle> {
        self.registry.handle(id)
    }

    pub fn filter(&self) -> &[String] {
        &self.filter
    }

    pub fn collected(&self) -> &HashSet<String> {
        &self.collected
    }

    pub fn selected(&self) -> &HashSet<String> {
        &self.selected
    }

    pub fn hide_completed(&self) -> bool {
        self.hide_completed
    }

    pub fn is_clustering_enabled(&self) -> bool {
        self.cluster.is_enabled()
    }

    pub fn active_subregions(&self) -> &[String] {
        &self.active_subregions
    }

    pub fn lasso(&self) -> &LassoSelection {
        &self.lasso
    }

    /// Creates empty groups up front so region changes can attach them
    pub fn register_subregions<I, S>(&mut self, subregions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for subregion in subregions {
            self.registry.ensure_group(Container::Subregion(subregion.into()));
        }
    }

    fn is_cluster_delegated(&self, type_key: &str) -> bool {
        self.cluster.is_enabled() && self.cluster.is_managed(type_key)
    }

    fn should_show(&self, id: &str, type_key: &str) -> bool {
        self.filter_set.contains(type_key) && !(self.hide_completed && self.collected.contains(id))
    }

    /// Indexes new records. Known ids and unknown types are skipped; returns
    /// the number of markers added.
    pub fn import_marker<I>(&mut self, records: I, layers: &mut LayerManager) -> usize
    where
        I: IntoIterator<Item = MarkerRecord>,
    {
        let mut added = Vec::new();
        for record in records {
            if self.registry.contains(&record.id) {
                continue;
            }
            let Some(marker_type) = self.catalog.get(&record.type_key) else {
                log::warn!("skipping marker {}: unknown type {}", record.id, record.type_key);
                continue;
            };

            let mut handle = MarkerHandle::new(&record, marker_type, &self.asset_host);
            handle.set_class(VisualClass::Checked, self.collected.contains(&record.id));
            handle.set_class(VisualClass::Selected, self.selected.contains(&record.id));

            let id = record.id.clone();
            let type_key = record.type_key.clone();
            let subregion = record.subregion_id.clone();
            self.registry.ensure_group(Container::Subregion(subregion.clone()));
            if self.active_subregions.contains(&subregion) {
                layers.attach(LayerId::SubregionGroup(subregion.clone()));
            }
            self.registry.insert(record, handle);

            if !self.is_cluster_delegated(&type_key) && self.should_show(&id, &type_key) {
                self.registry.set_parent(&id, Some(Container::Subregion(subregion)));
            }
            added.push(id);
        }

        let clustered = self
            .cluster
            .notify_markers_added(&added, &mut self.registry, layers);
        log::debug!("imported {} markers ({} cluster types touched)", added.len(), clustered);
        added.len()
    }

    /// Attaches the groups of `region`'s subregions and detaches all others
    pub fn change_region(&mut self, region: &Region, layers: &mut LayerManager) {
        let groups: Vec<Container> = self.registry.subregion_groups().cloned().collect();
        for container in &groups {
            layers.detach(&container.layer_id());
        }

        self.active_subregions = region.subregions.clone();
        for subregion in &region.subregions {
            self.registry.ensure_group(Container::Subregion(subregion.clone()));
            layers.attach(LayerId::SubregionGroup(subregion.clone()));
        }

        let now = self.clock.now();
        self.cluster.set_active_subregions(
            region.subregions.iter().cloned(),
            &mut self.registry,
            layers,
            now,
        );
        log::debug!("marker layer now shows {} subregions of {}", region.subregions.len(), region.key);
    }

    /// Replaces the filter and recomputes every marker's visibility
    pub fn filter_marker<I, S>(&mut self, types: I, layers: &mut LayerManager)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Vec::new();
        let mut filter_set = HashSet::default();
        for type_key in types {
            let type_key = type_key.as_ref().to_string();
            if filter_set.insert(type_key.clone()) {
                filter.push(type_key);
            }
        }
        self.filter = filter;
        self.filter_set = filter_set;
        self.reapply_filter(layers);
    }

    /// Recomputes visibility with the current filter
    pub fn reapply_filter(&mut self, layers: &mut LayerManager) {
        let now = self.clock.now();
        let ids = self.registry.ids().to_vec();
        for id in &ids {
            self.apply_marker(id, now);
        }
        self.cluster
            .apply_filter(&self.filter_set, &mut self.registry, layers, now);
        log::debug!(
            "filter applied: {} types, {} pending removals",
            self.filter.len(),
            self.pending_removals()
        );
    }

    fn apply_marker(&mut self, id: &str, now: Duration) {
        let Some(handle) = self.registry.handle(id) else {
            return;
        };
        let type_key = handle.type_key().to_string();
        let subregion = handle.subregion().to_string();
        let parent = handle.parent().cloned();

        if self.is_cluster_delegated(&type_key) {
            if matches!(parent, Some(Container::Subregion(_))) {
                self.registry.set_parent(id, None);
                self.set_class(id, VisualClass::FadeOut, false);
            }
            self.removals.cancel(&id.to_string());
            return;
        }

        if self.should_show(id, &type_key) {
            self.removals.cancel(&id.to_string());
            self.set_class(id, VisualClass::FadeOut, false);
            self.registry
                .set_parent(id, Some(Container::Subregion(subregion)));
        } else {
            let Some(parent) = parent else {
                return;
            };
            let key = id.to_string();
            if self.removals.is_pending(&key) {
                return;
            }
            self.set_class(id, VisualClass::FadeOut, true);
            self.removals.schedule(key, parent, now);
        }
    }

    fn set_class(&mut self, id: &str, class: VisualClass, on: bool) {
        if let Some(handle) = self.registry.handle_mut(id) {
            handle.set_class(class, on);
        }
    }

    /// Fires due removals. A removal only detaches a marker that is still in
    /// the container it was scheduled from.
    pub fn tick(&mut self, layers: &mut LayerManager) -> usize {
        let now = self.clock.now();
        let mut fired = 0;
        for (id, container) in self.removals.take_due(now) {
            let still_there = self
                .registry
                .handle(&id)
                .map_or(false, |handle| handle.parent() == Some(&container));
            if !still_there {
                continue;
            }
            self.registry.set_parent(&id, None);
            self.set_class(&id, VisualClass::FadeOut, false);
            fired += 1;
        }
        fired + self.cluster.tick(&mut self.registry, layers, now)
    }

    pub fn pending_removals(&self) -> usize {
        self.removals.len() + self.cluster.pending_removals()
    }

    fn sync_cluster_exclusion(&mut self) {
        let excluded = if self.hide_completed {
            self.collected.clone()
        } else {
            HashSet::default()
        };
        self.cluster.set_excluded(excluded);
    }

    /// Applies a new collected set; only markers whose state flipped are touched
    pub fn update_collected_points<I, S>(&mut self, ids: I, layers: &mut LayerManager)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let next: HashSet<String> = ids.into_iter().map(Into::into).collect();
        let flipped: Vec<String> = self.collected.symmetric_difference(&next).cloned().collect();
        self.collected = next;
        for id in &flipped {
            if let Some(handle) = self.registry.handle_mut(id) {
                handle.set_class(VisualClass::Checked, self.collected.contains(id));
            }
        }
        self.sync_cluster_exclusion();

        if !self.hide_completed || flipped.is_empty() {
            return;
        }

        let now = self.clock.now();
        let mut refresh_cluster = false;
        for id in &flipped {
            let Some(type_key) = self.registry.handle(id).map(|h| h.type_key().to_string()) else {
                continue;
            };
            if self.is_cluster_delegated(&type_key) {
                refresh_cluster = true;
            } else {
                self.apply_marker(id, now);
            }
        }
        if refresh_cluster {
            self.cluster.refresh(&mut self.registry, layers, now);
        }
    }

    pub fn set_hide_completed(&mut self, hide: bool, layers: &mut LayerManager) {
        if self.hide_completed == hide {
            return;
        }
        self.hide_completed = hide;
        self.sync_cluster_exclusion();
        self.reapply_filter(layers);
    }

    /// Markers of filtered types, not counting types the cluster layer handles
    pub fn visible_marker_count(&self) -> usize {
        self.filter
            .iter()
            .filter(|type_key| !self.is_cluster_delegated(type_key))
            .map(|type_key| self.registry.ids_of_type(type_key).len())
            .sum()
    }

    pub fn enable_clustering(&mut self, layers: &mut LayerManager) {
        if self.cluster.is_enabled() {
            return;
        }
        self.cluster.enable();
        self.reapply_filter(layers);
    }

    pub fn disable_clustering(&mut self, layers: &mut LayerManager) {
        if !self.cluster.is_enabled() {
            return;
        }
        self.cluster.disable(&mut self.registry, layers);
        self.reapply_filter(layers);
    }

    /// Records of a region's subregions, in import order
    pub fn current_points(&self, region: &Region) -> Vec<&MarkerRecord> {
        self.registry
            .ids()
            .iter()
            .filter_map(|id| self.registry.record(id))
            .filter(|record| region.has_subregion(&record.subregion_id))
            .collect()
    }

    /// Whether a marker is in a group that is attached to the viewport
    pub fn is_rendered(&self, id: &str, layers: &LayerManager) -> bool {
        self.registry
            .handle(id)
            .and_then(MarkerHandle::parent)
            .map_or(false, |parent| layers.is_attached(&parent.layer_id()))
    }

    /// Ids currently drawn as individual markers in a subregion group
    pub fn rendered_plain_ids(&self, layers: &LayerManager) -> Vec<String> {
        self.registry
            .handles()
            .filter(|handle| matches!(handle.parent(), Some(Container::Subregion(_))))
            .filter(|handle| self.is_rendered(handle.id(), layers))
            .map(|handle| handle.id().to_string())
            .collect()
    }

    pub fn set_selected_points<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let next: HashSet<String> = ids.into_iter().map(Into::into).collect();
        let flipped: Vec<String> = self.selected.symmetric_difference(&next).cloned().collect();
        self.selected = next;
        for id in &flipped {
            if let Some(handle) = self.registry.handle_mut(id) {
                handle.set_class(VisualClass::Selected, self.selected.contains(id));
            }
        }
    }

    /// Click on a marker toggles its selection; returns the new state
    pub fn toggle_selected(&mut self, id: &str) -> Option<bool> {
        let handle = self.registry.handle_mut(id)?;
        let selected = handle.toggle_class(VisualClass::Selected);
        if selected {
            self.selected.insert(id.to_string());
        } else {
            self.selected.remove(id);
        }
        Some(selected)
    }

    /// Markers a lasso may pick: filtered type, shown subregion, not hidden as completed
    fn lasso_candidates(&self, bounds: &LatLngBounds) -> Vec<String> {
        let hits: HashSet<String> = self.registry.ids_in_bounds(bounds).into_iter().collect();
        self.registry
            .ids()
            .iter()
            .filter(|id| hits.contains(*id))
            .filter(|id| {
                self.registry.record(id).map_or(false, |record| {
                    self.filter_set.contains(&record.type_key)
                        && self.active_subregions.contains(&record.subregion_id)
                        && !(self.hide_completed && self.collected.contains(&record.id))
                })
            })
            .cloned()
            .collect()
    }

    /// Handles one lasso event; `Select` returns the ids inside the rectangle
    pub fn handle_lasso(&mut self, event: &LassoEvent) -> Vec<String> {
        match event {
            LassoEvent::Highlight { bounds, deselect } => {
                let ids = self.lasso_candidates(bounds);
                self.lasso.highlight(
                    ids,
                    *deselect,
                    &mut self.registry,
                    &self.selected,
                    &self.collected,
                );
                Vec::new()
            }
            LassoEvent::Select { bounds, .. } => {
                let ids = self.lasso_candidates(bounds);
                self.lasso.select(ids)
            }
            LassoEvent::Clear => {
                self.lasso.clear(&mut self.registry, &self.selected);
                Vec::new()
            }
        }
    }
}
