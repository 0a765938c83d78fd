//! Subregion outlines and highlights.
//!
//! Each outline is drawn as a translucent fill plus a stroke. Hiding fades the
//! outline set out and detaches exactly that set afterwards, so a set shown in
//! the meantime is never removed by a stale timer.

use crate::animation::FadeScheduler;
use crate::core::clock::Clock;
use crate::core::config::Region;
use crate::core::geo::LatLng;
use crate::data::region::{AreaShape, SubregionCatalog};
use crate::layers::base::LayerId;
use crate::layers::manager::LayerManager;
use crate::prelude::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeRole {
    Fill,
    Stroke,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeStyle {
    pub fill_opacity: f32,
    pub stroke_weight: f32,
    pub stroke_opacity: f32,
}

impl ShapeRole {
    pub fn style(self) -> ShapeStyle {
        match self {
            ShapeRole::Fill => ShapeStyle {
                fill_opacity: 0.2,
                stroke_weight: 0.0,
                stroke_opacity: 0.0,
            },
            ShapeRole::Stroke => ShapeStyle {
                fill_opacity: 0.0,
                stroke_weight: 2.0,
                stroke_opacity: 0.8,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryShape {
    pub subregion: String,
    pub role: ShapeRole,
    pub geometry: AreaShape,
    pub hidden: bool,
}

/// One attached outline layer and its shapes
#[derive(Debug, Clone)]
pub struct BoundarySet {
    pub layer: LayerId,
    pub shapes: Vec<BoundaryShape>,
}

pub struct BoundaryManager {
    areas: Arc<SubregionCatalog>,
    clock: Arc<dyn Clock>,
    active: Option<BoundarySet>,
    fading: Vec<BoundarySet>,
    removals: FadeScheduler<LayerId>,
    highlight: Option<BoundarySet>,
    highlight_timer: FadeScheduler<LayerId>,
    generation: u64,
}

impl std::fmt::Debug for BoundaryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundaryManager")
            .field("active", &self.active.as_ref().map(|set| &set.layer))
            .field("fading", &self.fading.len())
            .field("highlight", &self.highlight.as_ref().map(|set| &set.layer))
            .finish()
    }
}

fn shapes_for(subregion: &str, geometry: AreaShape) -> [BoundaryShape; 2] {
    [ShapeRole::Fill, ShapeRole::Stroke].map(|role| BoundaryShape {
        subregion: subregion.to_string(),
        role,
        geometry: geometry.clone(),
        hidden: false,
    })
}

impl BoundaryManager {
    pub fn new(areas: Arc<SubregionCatalog>, clock: Arc<dyn Clock>, fade: Duration, highlight: Duration) -> Self {
        Self {
            areas,
            clock,
            active: None,
            fading: Vec::new(),
            removals: FadeScheduler::new(fade),
            highlight: None,
            highlight_timer: FadeScheduler::new(highlight),
            generation: 0,
        }
    }

    pub fn areas(&self) -> &SubregionCatalog {
        &self.areas
    }

    pub fn is_visible(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&BoundarySet> {
        self.active.as_ref()
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.highlight
            .as_ref()
            .and_then(|set| set.shapes.first())
            .map(|shape| shape.subregion.as_str())
    }

    /// Outlines every subregion of `region` that has area data
    pub fn show(&mut self, region: &Region, layers: &mut LayerManager) {
        if self.active.is_some() {
            self.hide();
        }
        let projection = region.projection();
        let shapes: Vec<BoundaryShape> = region
            .subregions
            .iter()
            .filter_map(|id| {
                let geometry = self.areas.get(id)?.shape(&projection)?;
                Some(shapes_for(id, geometry))
            })
            .flatten()
            .collect();
        if shapes.is_empty() {
            return;
        }

        self.generation += 1;
        let layer = LayerId::Boundary(format!("{}#{}", region.key, self.generation));
        layers.attach(layer.clone());
        log::debug!("showing {} boundary shapes as {}", shapes.len(), layer);
        self.active = Some(BoundarySet { layer, shapes });
    }

    /// Fades the current outlines out; they are detached on a later tick
    pub fn hide(&mut self) {
        let Some(mut set) = self.active.take() else {
            return;
        };
        for shape in &mut set.shapes {
            shape.hidden = true;
        }
        self.removals.schedule(set.layer.clone(), (), self.clock.now());
        self.fading.push(set);
    }

    /// Drops the highlight and fades the outlines, for a region teardown
    pub fn reset(&mut self) {
        if let Some(previous) = self.highlight.take() {
            self.highlight_timer.cancel(&previous.layer);
        }
        self.hide();
    }

    /// Emphasises one subregion for a short while
    pub fn highlight(&mut self, subregion: &str, region: &Region, layers: &mut LayerManager) -> bool {
        if let Some(previous) = self.highlight.take() {
            self.highlight_timer.cancel(&previous.layer);
            layers.detach(&previous.layer);
        }
        let Some(geometry) = self
            .areas
            .get(subregion)
            .and_then(|area| area.shape(&region.projection()))
        else {
            return false;
        };
        let layer = LayerId::Highlight(subregion.to_string());
        layers.attach(layer.clone());
        self.highlight_timer
            .schedule(layer.clone(), (), self.clock.now());
        self.highlight = Some(BoundarySet {
            layer,
            shapes: shapes_for(subregion, geometry).to_vec(),
        });
        true
    }

    /// Subregion of `region` containing `point`
    pub fn subregion_at(&self, point: &LatLng, region: &Region) -> Option<String> {
        let projection = region.projection();
        region
            .subregions
            .iter()
            .find(|id| {
                self.areas
                    .get(id)
                    .and_then(|area| area.shape(&projection))
                    .map_or(false, |shape| shape.contains(point))
            })
            .cloned()
    }

    pub fn tick(&mut self, layers: &mut LayerManager) {
        let now = self.clock.now();
        for (layer, ()) in self.removals.take_due(now) {
            layers.detach(&layer);
            self.fading.retain(|set| set.layer != layer);
        }
        for (layer, ()) in self.highlight_timer.take_due(now) {
            layers.detach(&layer);
            if self.highlight.as_ref().map(|set| &set.layer) == Some(&layer) {
                self.highlight = None;
            }
        }
    }
}
