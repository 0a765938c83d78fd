//! Binds the persisted stores to the map.
//!
//! A front-end mutates state through [`MapSession`]; each method updates the
//! matching store and makes the imperative call on [`MapCore`]. Map events
//! are pumped back out to the label and link overlays, which live here
//! because they depend on the locale and devtool data rather than the map.

use crate::core::constants::{DEFAULT_REGION, SUBREGION_FOCUS_ZOOM};
use crate::core::geo::LatLng;
use crate::core::map::MapCore;
use crate::data::label::LabelData;
use crate::data::link::LinkData;
use crate::data::locale::{JsonLocale, LocaleLookup};
use crate::data::marker::MarkerDataset;
use crate::input::events::{LassoEvent, MapEvent};
use crate::layers::label::LabelOverlay;
use crate::layers::link::{LinkArea, LinkOverlay};
use crate::store::{MapPrefs, MarkerStore, RegionStore, Storage, UserRecord};
use crate::{MapError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct MapSession {
    core: MapCore,
    labels: LabelOverlay,
    links: LinkOverlay,
    storage: Arc<dyn Storage>,
    region_store: RegionStore,
    marker_store: MarkerStore,
    user_record: UserRecord,
    prefs: MapPrefs,
    /// Subregion to highlight once the focus move settles
    pending_highlight: Option<String>,
}

impl std::fmt::Debug for MapSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSession")
            .field("core", &self.core)
            .field("region_store", &self.region_store)
            .field("filter", &self.marker_store.filter())
            .field("collected", &self.user_record.points().len())
            .field("prefs", &self.prefs)
            .finish()
    }
}

impl MapSession {
    /// Restores every store from `storage`. Overlays start empty.
    pub fn new(core: MapCore, storage: Arc<dyn Storage>) -> Self {
        let clock = core.clock();
        let transitions = core.options().transitions.clone();
        let labels = LabelOverlay::new(
            LabelData::default(),
            Arc::new(JsonLocale::default()),
            Arc::new(AtomicBool::new(false)),
            clock.clone(),
            transitions.label_fade(),
        );
        let links = LinkOverlay::new(LinkData::default(), clock, transitions.link_tooltip_hide());

        Self {
            core,
            labels,
            links,
            region_store: RegionStore::load(storage.as_ref()),
            marker_store: MarkerStore::load(storage.as_ref()),
            user_record: UserRecord::load(storage.as_ref()),
            prefs: MapPrefs::load(storage.as_ref()),
            storage,
            pending_highlight: None,
        }
    }

    pub fn core(&self) -> &MapCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut MapCore {
        &mut self.core
    }

    pub fn labels(&self) -> &LabelOverlay {
        &self.labels
    }

    pub fn links(&self) -> &LinkOverlay {
        &self.links
    }

    pub fn region_store(&self) -> &RegionStore {
        &self.region_store
    }

    pub fn marker_store(&self) -> &MarkerStore {
        &self.marker_store
    }

    pub fn user_record(&self) -> &UserRecord {
        &self.user_record
    }

    pub fn prefs(&self) -> &MapPrefs {
        &self.prefs
    }

    /// Imports the dataset, applies the saved state and opens the saved region
    pub async fn init(&mut self, dataset: &MarkerDataset) -> Result<()> {
        self.core.update_collected_points(self.user_record.points().to_vec());
        self.core.set_hide_completed(self.prefs.hide_completed);
        if self.prefs.clustering {
            self.core.enable_marker_clustering();
        }
        self.core.filter_markers(self.marker_store.filter().to_vec());
        self.core.with_marker_layer(|markers, _| {
            markers.register_subregions(dataset.subregion_ids().map(str::to_string))
        });
        let imported = self.core.import_markers(dataset.world().cloned());
        log::debug!("session imported {} of {} markers", imported, dataset.len());

        let layer = self.prefs.layer.clone();
        self.core.switch_layer(&layer).await?;

        let region = self.region_store.current_region().to_string();
        match self.core.switch_region(&region).await {
            Err(MapError::RegionNotFound(_)) if region != DEFAULT_REGION => {
                log::warn!("saved region {} is unknown, opening {}", region, DEFAULT_REGION);
                self.core.switch_region(DEFAULT_REGION).await?;
                self.region_store.set_current_region(DEFAULT_REGION);
            }
            other => other?,
        }
        self.pump_events();
        Ok(())
    }

    pub async fn set_region(&mut self, key: &str) -> Result<()> {
        if self.core.current_region_key() == Some(key) {
            return Ok(());
        }
        self.core.switch_region(key).await?;
        self.region_store.set_current_region(key);
        self.pump_events();
        Ok(())
    }

    pub fn request_subregion_switch(&mut self, subregion: impl Into<String>) {
        self.region_store.request_subregion_switch(subregion);
    }

    /// Handles a pending subregion request: opens its region if needed,
    /// centres on it and highlights it once the camera settles. The request
    /// is consumed even when it names an unknown subregion.
    pub async fn process_subregion_request(&mut self) -> Result<bool> {
        let Some(subregion) = self.region_store.take_subregion_switch_request() else {
            return Ok(false);
        };
        if self.core.boundaries().areas().get(&subregion).is_none() {
            log::warn!("ignoring switch request for unknown subregion {}", subregion);
            return Ok(false);
        }

        let target = self
            .core
            .regions()
            .region_of_subregion(&subregion)
            .map(str::to_string);
        if let Some(target) = target {
            self.set_region(&target).await?;
        }

        self.region_store.set_current_subregion(subregion.clone());
        self.pending_highlight = Some(subregion.clone());
        if !self.core.focus_subregion(&subregion, SUBREGION_FOCUS_ZOOM, true) {
            self.pending_highlight = None;
        }
        self.pump_events();
        Ok(true)
    }

    pub fn toggle_filter(&mut self, type_key: &str) -> bool {
        let on = self.marker_store.switch_filter(type_key);
        self.core.filter_markers(self.marker_store.filter().to_vec());
        on
    }

    pub fn set_filter<I, S>(&mut self, types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.marker_store.set_filter(types);
        self.core.filter_markers(self.marker_store.filter().to_vec());
    }

    fn sync_collected(&mut self) {
        self.core.update_collected_points(self.user_record.points().to_vec());
    }

    pub fn add_collected(&mut self, id: &str) {
        if self.user_record.add_point(id) {
            self.sync_collected();
        }
    }

    pub fn remove_collected(&mut self, id: &str) {
        if self.user_record.delete_point(id) {
            self.sync_collected();
        }
    }

    pub fn set_collected<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_record.set_points(ids);
        self.sync_collected();
    }

    pub fn set_hide_completed(&mut self, hide: bool) {
        self.prefs.hide_completed = hide;
        self.core.set_hide_completed(hide);
    }

    pub fn set_cluster_enabled(&mut self, enabled: bool) {
        self.prefs.clustering = enabled;
        if enabled {
            self.core.enable_marker_clustering();
        } else {
            self.core.disable_marker_clustering();
        }
    }

    pub fn set_boundaries_visible(&mut self, visible: bool) {
        self.prefs.boundaries = visible;
        if visible {
            self.core.show_subregion_boundaries();
        } else {
            self.core.hide_subregion_boundaries();
        }
    }

    pub async fn set_layer(&mut self, skin: &str) -> Result<()> {
        self.core.switch_layer(skin).await?;
        self.prefs.layer = self.core.skin().to_string();
        self.pump_events();
        Ok(())
    }

    pub fn set_labels_visible(&mut self, visible: bool) {
        self.prefs.labels = visible;
        let zoom = self.core.viewport().zoom;
        self.labels.set_enabled(visible, zoom, self.core.layers_mut());
    }

    pub fn set_label_data(&mut self, data: LabelData) {
        let zoom = self.core.viewport().zoom;
        self.labels.set_data(data, zoom, self.core.layers_mut());
    }

    pub fn set_locale(&mut self, locale: Arc<dyn LocaleLookup>) {
        let zoom = self.core.viewport().zoom;
        self.labels.set_locale(locale, zoom, self.core.layers_mut());
    }

    pub fn set_link_data(&mut self, data: LinkData) {
        let region = self.core.region().cloned();
        self.links.set_data(data, region.as_ref(), self.core.layers_mut());
    }

    /// The label editing tool announces itself through this flag
    pub fn set_label_tool_mounted(&mut self, mounted: bool) {
        let flag = self.labels.tool_flag();
        if flag.swap(mounted, Ordering::SeqCst) == mounted {
            return;
        }
        self.core.emit(if mounted {
            MapEvent::LabelToolMounted
        } else {
            MapEvent::LabelToolUnmounted
        });
        self.pump_events();
    }

    pub fn pointer_move(&mut self, position: &LatLng) -> Option<&LinkArea> {
        self.links.pointer_move(position)
    }

    pub fn toggle_selected(&mut self, id: &str) -> Option<bool> {
        let selected = self
            .core
            .with_marker_layer(|markers, _| markers.toggle_selected(id))?;
        if selected {
            self.marker_store.extend_selected([id.to_string()]);
        } else {
            self.marker_store.remove_selected(&[id.to_string()]);
        }
        Some(selected)
    }

    /// Runs a lasso phase; a committed selection is merged into (or removed
    /// from) the selected points
    pub fn lasso(&mut self, event: LassoEvent) -> Vec<String> {
        let deselect = matches!(event, LassoEvent::Select { deselect: true, .. });
        let commit = matches!(event, LassoEvent::Select { .. });
        let ids = self.core.lasso(event);
        if commit {
            if deselect {
                self.marker_store.remove_selected(&ids);
            } else {
                self.marker_store.extend_selected(ids.iter().cloned());
            }
            let selected = self.marker_store.selected().to_vec();
            self.core
                .with_marker_layer(|markers, _| markers.set_selected_points(selected));
        }
        self.pump_events();
        ids
    }

    /// Advances timers on the map and the overlays, then dispatches events
    pub fn tick(&mut self) -> Vec<MapEvent> {
        self.core.tick();
        self.labels.tick(self.core.layers_mut());
        self.links.tick();
        self.pump_events()
    }

    /// Delivers queued map events to listeners and the overlays
    pub fn pump_events(&mut self) -> Vec<MapEvent> {
        let events = self.core.process_events();
        for event in &events {
            match event {
                MapEvent::RegionSwitched { .. } => {
                    let Some(region) = self.core.region().cloned() else {
                        continue;
                    };
                    let zoom = self.core.viewport().zoom;
                    self.labels
                        .on_region_switched(&region, zoom, self.core.layers_mut());
                    self.links.on_region_switched(&region, self.core.layers_mut());
                    if self.prefs.boundaries {
                        self.core.show_subregion_boundaries();
                    }
                }
                MapEvent::ZoomEnd { zoom } => {
                    self.labels.on_zoom_end(*zoom, self.core.layers_mut());
                }
                MapEvent::MoveEnd { .. } => {
                    if let Some(subregion) = self.pending_highlight.take() {
                        self.core.highlight_subregion(&subregion);
                    }
                }
                MapEvent::LabelToolMounted | MapEvent::LabelToolUnmounted => {
                    let zoom = self.core.viewport().zoom;
                    self.labels.refresh(zoom, self.core.layers_mut());
                }
                _ => {}
            }
        }
        events
    }

    pub async fn refresh_tiles(&mut self) {
        self.core.refresh_tiles().await;
    }

    /// Writes every store through to storage
    pub fn save(&self) -> Result<()> {
        let storage = self.storage.as_ref();
        self.region_store.save(storage)?;
        self.marker_store.save(storage)?;
        self.user_record.save(storage)?;
        self.prefs.save(storage)
    }
}
