//! The map: viewport, attached layers and region lifecycle.
//!
//! [`MapCore`] owns every component that draws into the viewport. Region
//! switches tear the viewport down and rebuild it for the new region; camera
//! operations emit [`MapEvent`]s that the session forwards to the overlays.

use crate::animation::CameraTransition;
use crate::core::clock::Clock;
use crate::core::config::{MapOptions, Region, RegionCatalog};
use crate::core::constants;
use crate::core::geo::{LatLng, Point};
use crate::core::viewport::Viewport;
use crate::data::marker::MarkerRecord;
use crate::input::events::{EventKind, LassoEvent, MapEvent};
use crate::input::handler::EventManager;
use crate::layers::base::{LayerId, LayerTrait};
use crate::layers::boundary::BoundaryManager;
use crate::layers::manager::LayerManager;
use crate::layers::marker::MarkerLayer;
use crate::layers::tile::{is_known_skin, TileLayer, BASE_SKIN};
use crate::store::view_state::{ViewState, ViewStateStore};
use crate::tiles::loader::TileLoader;
use crate::tiles::source::TileUrlProvider;
use crate::{MapError, Result};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapState {
    Ready,
    /// A region switch started and has not finished yet
    Switching(String),
}

pub struct MapCore {
    options: MapOptions,
    regions: RegionCatalog,
    viewport: Viewport,
    layers: LayerManager,
    events: EventManager,
    clock: Arc<dyn Clock>,
    tiles: TileLoader,
    tile_urls: Arc<dyn TileUrlProvider>,
    view_states: Box<dyn ViewStateStore>,
    base_tiles: Option<TileLayer>,
    secondary_tiles: Option<TileLayer>,
    skin: String,
    boundaries: BoundaryManager,
    marker_layer: MarkerLayer,
    state: MapState,
    region: Option<Region>,
    transforming: bool,
    transition: Option<CameraTransition>,
    dragging: bool,
}

impl std::fmt::Debug for MapCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapCore")
            .field("state", &self.state)
            .field("region", &self.region.as_ref().map(|r| &r.key))
            .field("skin", &self.skin)
            .field("viewport", &self.viewport)
            .field("layers", &self.layers.layers())
            .field("transforming", &self.transforming)
            .finish()
    }
}

impl MapCore {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        options: MapOptions,
        regions: RegionCatalog,
        clock: Arc<dyn Clock>,
        tiles: TileLoader,
        tile_urls: Arc<dyn TileUrlProvider>,
        view_states: Box<dyn ViewStateStore>,
        boundaries: BoundaryManager,
        marker_layer: MarkerLayer,
    ) -> Self {
        let mut viewport = Viewport::new(
            LatLng::default(),
            constants::DEFAULT_ZOOM,
            options.viewport_size,
        );
        viewport.zoom_snap = options.zoom_snap;
        viewport.set_zoom_limits(options.min_zoom, f64::INFINITY);

        Self {
            options,
            regions,
            viewport,
            layers: LayerManager::new(),
            events: EventManager::new(),
            clock,
            tiles,
            tile_urls,
            view_states,
            base_tiles: None,
            secondary_tiles: None,
            skin: BASE_SKIN.to_string(),
            boundaries,
            marker_layer,
            state: MapState::Ready,
            region: None,
            transforming: false,
            transition: None,
            dragging: false,
        }
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn regions(&self) -> &RegionCatalog {
        &self.regions
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn state(&self) -> &MapState {
        &self.state
    }

    pub fn region(&self) -> Option<&Region> {
        self.region.as_ref()
    }

    pub fn current_region_key(&self) -> Option<&str> {
        self.region.as_ref().map(|region| region.key.as_str())
    }

    pub fn skin(&self) -> &str {
        &self.skin
    }

    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    /// Attachment registry, for overlays owned outside the map
    pub fn layers_mut(&mut self) -> &mut LayerManager {
        &mut self.layers
    }

    pub fn base_tiles(&self) -> Option<&TileLayer> {
        self.base_tiles.as_ref()
    }

    pub fn secondary_tiles(&self) -> Option<&TileLayer> {
        self.secondary_tiles.as_ref()
    }

    pub fn boundaries(&self) -> &BoundaryManager {
        &self.boundaries
    }

    pub fn marker_layer(&self) -> &MarkerLayer {
        &self.marker_layer
    }

    pub fn view_states(&self) -> &dyn ViewStateStore {
        self.view_states.as_ref()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn is_transforming(&self) -> bool {
        self.transforming
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn camera_transition(&self) -> Option<&CameraTransition> {
        self.transition.as_ref()
    }

    /// Runs `f` with the marker layer and the attachment registry
    pub fn with_marker_layer<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut MarkerLayer, &mut LayerManager) -> R,
    {
        f(&mut self.marker_layer, &mut self.layers)
    }

    pub fn on<F>(&mut self, kind: EventKind, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, callback);
    }

    /// Delivers queued events to listeners and hands them back in order
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        self.events.process_events()
    }

    pub fn emit(&mut self, event: MapEvent) {
        self.events.emit(event);
    }

    /// Switches the viewport to another region.
    ///
    /// Everything attached to the viewport is removed first; the camera is
    /// restored from the saved view state (or the region's start position),
    /// the new base tiles are loaded and [`MapEvent::RegionSwitched`] is
    /// queued once the first tiles are in.
    pub async fn switch_region(&mut self, key: &str) -> Result<()> {
        let region = self.regions.resolve(key)?;
        if self.options.min_zoom > region.max_view_zoom() {
            return Err(MapError::InvalidOptions(format!(
                "min_zoom {} is above the maximum zoom {} of {}",
                self.options.min_zoom,
                region.max_view_zoom(),
                region.key
            )));
        }

        if let MapState::Switching(previous) = &self.state {
            log::debug!("switch to {} superseded by {}", previous, key);
        }
        self.state = MapState::Switching(region.key.clone());
        log::debug!("switching region to {}", region.key);

        self.boundaries.reset();
        let removed = self.layers.clear();
        self.base_tiles = None;
        self.secondary_tiles = None;
        self.transition = None;
        self.transforming = false;
        self.dragging = false;
        log::debug!("detached {} layers", removed.len());

        let projection = region.projection();
        self.viewport
            .set_zoom_limits(self.options.min_zoom, region.max_view_zoom());
        self.viewport.set_max_bounds(None);
        match self.view_states.get_view_state(&region.key) {
            Some(view) => {
                self.viewport.set_center(view.center());
                self.viewport.set_zoom(view.zoom);
            }
            None => {
                self.viewport
                    .set_center(projection.initial_center(region.initial_offset));
                self.viewport.set_zoom(region.initial_zoom);
            }
        }
        self.viewport.set_max_bounds(Some(projection.max_bounds()));

        let template = self.tile_urls.template(&region.key, None);
        self.base_tiles = Some(TileLayer::new(
            LayerId::BaseTiles,
            region.key.clone(),
            template,
            region.tile_size,
            projection,
        ));
        self.layers.attach(LayerId::BaseTiles);
        if self.skin != BASE_SKIN {
            self.attach_secondary(&region);
        }

        self.marker_layer.change_region(&region, &mut self.layers);

        if let Some(base) = self.base_tiles.as_mut() {
            let report = base.load_visible(&self.viewport, &self.tiles).await;
            log::debug!("{} base tiles: {:?}", region.key, report);
        }
        if let Some(secondary) = self.secondary_tiles.as_mut() {
            let report = secondary.load_visible(&self.viewport, &self.tiles).await;
            log::debug!("{} {} tiles: {:?}", region.key, self.skin, report);
        }

        self.events.emit(MapEvent::RegionSwitched {
            region: region.key.clone(),
        });
        self.region = Some(region);
        self.state = MapState::Ready;
        Ok(())
    }

    fn attach_secondary(&mut self, region: &Region) {
        let template = self.tile_urls.template(&region.key, Some(&self.skin));
        let layer = TileLayer::new(
            LayerId::SecondaryTiles,
            region.key.clone(),
            template,
            region.tile_size,
            region.projection(),
        )
        .with_skin(self.skin.clone());
        self.layers.attach(LayerId::SecondaryTiles);
        self.secondary_tiles = Some(layer);
        if let Some(base) = self.base_tiles.as_mut() {
            base.set_opacity(self.options.tiles.secondary_base_opacity);
        }
    }

    /// Shows a secondary map skin above the base tiles, or removes it for `M`
    pub async fn switch_layer(&mut self, skin: &str) -> Result<()> {
        if !is_known_skin(skin) {
            return Err(MapError::Data(format!("unknown map layer: {skin}")));
        }
        let skin = skin.to_uppercase();
        if skin == self.skin {
            return Ok(());
        }
        self.skin = skin;

        let Some(region) = self.region.clone() else {
            return Ok(());
        };

        self.layers.detach(&LayerId::SecondaryTiles);
        self.secondary_tiles = None;
        if self.skin == BASE_SKIN {
            if let Some(base) = self.base_tiles.as_mut() {
                base.set_opacity(1.0);
            }
        } else {
            self.attach_secondary(&region);
            if let Some(secondary) = self.secondary_tiles.as_mut() {
                let report = secondary.load_visible(&self.viewport, &self.tiles).await;
                log::debug!("{} {} tiles: {:?}", region.key, self.skin, report);
            }
        }

        self.events.emit(MapEvent::LayerSwitched {
            layer: self.skin.clone(),
        });
        Ok(())
    }

    /// Loads tiles that became visible since the last load
    pub async fn refresh_tiles(&mut self) {
        if let Some(base) = self.base_tiles.as_mut() {
            let report = base.load_visible(&self.viewport, &self.tiles).await;
            if report.requested > 0 {
                log::debug!("refreshed base tiles: {:?}", report);
            }
        }
        if let Some(secondary) = self.secondary_tiles.as_mut() {
            secondary.load_visible(&self.viewport, &self.tiles).await;
        }
    }

    /// Programmatic camera move. Ignored while another one is running; the
    /// resulting settle does not overwrite the saved view state.
    pub fn set_map_view(&mut self, view: ViewState, animate: bool) -> bool {
        if self.transforming {
            return false;
        }
        self.transforming = true;

        let target_center = self.clamp_center(view.center());
        let target_zoom = self.viewport.clamp_zoom(view.zoom);
        let transitions = &self.options.transitions;
        if animate && !transitions.camera_duration().is_zero() {
            self.transition = Some(CameraTransition::new(
                (self.viewport.center, self.viewport.zoom),
                (target_center, target_zoom),
                self.clock.now(),
                transitions.camera_duration(),
                transitions.camera_easing,
            ));
            return true;
        }

        self.apply_camera(target_center, target_zoom);
        self.settle(true, true);
        true
    }

    fn clamp_center(&self, center: LatLng) -> LatLng {
        match self.viewport.max_bounds() {
            Some(bounds) => bounds.clamp(&center),
            None => center,
        }
    }

    fn apply_camera(&mut self, center: LatLng, zoom: f64) {
        let zoom_changed = (self.viewport.zoom - zoom).abs() > f64::EPSILON;
        self.viewport.set_zoom(zoom);
        self.viewport.set_center(center);
        self.events.emit(MapEvent::Move {
            center: self.viewport.center,
        });
        if zoom_changed {
            self.events.emit(MapEvent::Zoom {
                zoom: self.viewport.zoom,
            });
        }
    }

    /// Queues the settle events and records the view unless a programmatic
    /// move produced them.
    fn settle(&mut self, moved: bool, zoomed: bool) {
        if zoomed {
            self.events.emit(MapEvent::ZoomEnd {
                zoom: self.viewport.zoom,
            });
        }
        if moved {
            self.events.emit(MapEvent::MoveEnd {
                center: self.viewport.center,
            });
        }

        if self.transforming {
            self.transforming = false;
            return;
        }
        self.save_view_state();
    }

    fn save_view_state(&mut self) {
        let Some(region) = self.region.as_ref() else {
            return;
        };
        let view = ViewState::new(self.viewport.center, self.viewport.zoom);
        if let Err(e) = self.view_states.save_view_state(&region.key, view) {
            log::warn!("could not save view state for {}: {}", region.key, e);
        }
    }

    /// A user gesture takes over from a running programmatic move
    fn interrupt_transition(&mut self) {
        if self.transition.take().is_some() {
            self.transforming = false;
        }
    }

    pub fn pan_by(&mut self, delta: Point) {
        self.interrupt_transition();
        let applied = self.viewport.pan(delta);
        if applied.x == 0.0 && applied.y == 0.0 {
            return;
        }
        self.events.emit(MapEvent::Move {
            center: self.viewport.center,
        });
        self.settle(true, false);
    }

    /// Zooms to a snapped level, keeping `focus` (screen pixels) fixed if given
    pub fn zoom_to(&mut self, zoom: f64, focus: Option<Point>) {
        self.interrupt_transition();
        let target = self.viewport.clamp_zoom(self.viewport.snap_zoom(zoom));
        if (target - self.viewport.zoom).abs() < 1e-9 {
            return;
        }
        let before = self.viewport.center;
        self.viewport.zoom_to(target, focus);
        self.events.emit(MapEvent::Zoom {
            zoom: self.viewport.zoom,
        });
        let moved = before != self.viewport.center;
        if moved {
            self.events.emit(MapEvent::Move {
                center: self.viewport.center,
            });
        }
        self.settle(true, true);
    }

    pub fn zoom_in(&mut self) {
        self.zoom_to(self.viewport.zoom + self.options.zoom_delta, None);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_to(self.viewport.zoom - self.options.zoom_delta, None);
    }

    pub fn begin_drag(&mut self) {
        if self.dragging {
            return;
        }
        self.interrupt_transition();
        self.dragging = true;
        self.events.emit(MapEvent::DragStart);
    }

    pub fn drag_by(&mut self, delta: Point) {
        if !self.dragging {
            return;
        }
        let applied = self.viewport.pan(delta);
        if applied.x != 0.0 || applied.y != 0.0 {
            self.events.emit(MapEvent::Move {
                center: self.viewport.center,
            });
        }
    }

    pub fn end_drag(&mut self) {
        if !self.dragging {
            return;
        }
        self.dragging = false;
        self.events.emit(MapEvent::DragEnd);
        self.settle(true, false);
    }

    /// Centres the camera on a subregion of the current region
    pub fn focus_subregion(&mut self, subregion: &str, zoom: f64, animate: bool) -> bool {
        let Some(region) = self.region.as_ref() else {
            return false;
        };
        let Some(center) = self
            .boundaries
            .areas()
            .get(subregion)
            .and_then(|area| area.center(&region.projection()))
        else {
            return false;
        };
        self.set_map_view(ViewState::new(center, zoom), animate)
    }

    pub fn show_subregion_boundaries(&mut self) {
        if let Some(region) = self.region.as_ref() {
            self.boundaries.show(region, &mut self.layers);
        }
    }

    pub fn hide_subregion_boundaries(&mut self) {
        self.boundaries.hide();
    }

    pub fn highlight_subregion(&mut self, subregion: &str) -> bool {
        match self.region.as_ref() {
            Some(region) => self.boundaries.highlight(subregion, region, &mut self.layers),
            None => false,
        }
    }

    /// Subregion of the current region under a map coordinate
    pub fn subregion_at(&self, point: &LatLng) -> Option<String> {
        let region = self.region.as_ref()?;
        self.boundaries.subregion_at(point, region)
    }

    pub fn import_markers<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = MarkerRecord>,
    {
        self.marker_layer.import_marker(records, &mut self.layers)
    }

    pub fn filter_markers<I, S>(&mut self, types: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.marker_layer.filter_marker(types, &mut self.layers);
    }

    pub fn update_collected_points<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.marker_layer.update_collected_points(ids, &mut self.layers);
    }

    pub fn set_hide_completed(&mut self, hide: bool) {
        self.marker_layer.set_hide_completed(hide, &mut self.layers);
    }

    pub fn enable_marker_clustering(&mut self) {
        self.marker_layer.enable_clustering(&mut self.layers);
    }

    pub fn disable_marker_clustering(&mut self) {
        self.marker_layer.disable_clustering(&mut self.layers);
    }

    /// Forwards a lasso gesture to the marker layer and queues the matching event
    pub fn lasso(&mut self, event: LassoEvent) -> Vec<String> {
        let selected = self.marker_layer.handle_lasso(&event);
        let map_event = match event {
            LassoEvent::Highlight { bounds, deselect } => MapEvent::LassoHighlight { bounds, deselect },
            LassoEvent::Select { bounds, deselect } => MapEvent::LassoSelect {
                bounds,
                deselect,
                selected: selected.clone(),
            },
            LassoEvent::Clear => MapEvent::LassoClear,
        };
        self.events.emit(map_event);
        selected
    }

    /// Fires everything whose time has come: delayed marker and boundary
    /// removals, highlight expiry and camera transition frames.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        let removed = self.marker_layer.tick(&mut self.layers);
        if removed > 0 {
            log::trace!("{} markers detached", removed);
        }
        self.boundaries.tick(&mut self.layers);

        let Some(transition) = self.transition.as_ref() else {
            return;
        };
        let frame = transition.sample(now);
        let zoomed = (transition.to_zoom - transition.from_zoom).abs() > f64::EPSILON;
        self.apply_camera(frame.center, frame.zoom);
        if frame.finished {
            self.transition = None;
            self.settle(true, zoomed);
        }
    }
}
