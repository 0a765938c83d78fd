//! Link hotspots: square areas with an optional image and a hover tooltip.

use crate::animation::FadeScheduler;
use crate::core::clock::Clock;
use crate::core::config::Region;
use crate::core::geo::{LatLng, LatLngBounds, Point};
use crate::core::viewport::Viewport;
use crate::data::link::{GlobalLinkConfig, LinkData};
use crate::layers::base::{LayerId, LayerProperties, LayerTrait, LayerType};
use crate::layers::manager::LayerManager;
use crate::prelude::{Arc, HashMap};
use std::time::Duration;

/// Vertical gap between the tooltip and the top edge of its link, in pixels
const TOOLTIP_OFFSET: f64 = 12.0;

#[derive(Debug, Clone, PartialEq)]
pub struct LinkArea {
    pub id: String,
    pub bounds: LatLngBounds,
    pub image_url: Option<String>,
}

/// Tooltip anchored at the top centre of the hovered link
#[derive(Debug, Clone, PartialEq)]
pub struct LinkTooltip {
    pub link_id: String,
    pub anchor: LatLng,
    pub config: GlobalLinkConfig,
}

pub struct LinkOverlay {
    properties: LayerProperties,
    data: LinkData,
    images: HashMap<String, String>,
    clock: Arc<dyn Clock>,
    areas: Vec<LinkArea>,
    hovered: Option<String>,
    tooltip: Option<LinkTooltip>,
    hide: FadeScheduler<()>,
    region_code: Option<String>,
}

impl std::fmt::Debug for LinkOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkOverlay")
            .field("region", &self.region_code)
            .field("areas", &self.areas.len())
            .field("hovered", &self.hovered)
            .finish()
    }
}

impl LinkOverlay {
    pub fn new(data: LinkData, clock: Arc<dyn Clock>, hide_delay: Duration) -> Self {
        Self {
            properties: LayerProperties::new(LayerId::Links, LayerType::Link),
            data,
            images: HashMap::default(),
            clock,
            areas: Vec::new(),
            hovered: None,
            tooltip: None,
            hide: FadeScheduler::new(hide_delay),
            region_code: None,
        }
    }

    /// Image drawn over a link's square
    pub fn set_image(&mut self, link_id: impl Into<String>, url: impl Into<String>) {
        self.images.insert(link_id.into(), url.into());
    }

    pub fn areas(&self) -> &[LinkArea] {
        &self.areas
    }

    pub fn tooltip(&self) -> Option<&LinkTooltip> {
        self.tooltip.as_ref()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Rebuilds the link areas for the new region and drops any hover state
    pub fn on_region_switched(&mut self, region: &Region, layers: &mut LayerManager) {
        self.region_code = Some(region.code.clone());
        self.rebuild(region, layers);
        if self.hovered.take().is_some() || self.tooltip.is_some() {
            self.hide.schedule((), (), self.clock.now());
        }
    }

    fn rebuild(&mut self, region: &Region, layers: &mut LayerManager) {
        let projection = region.projection();
        self.areas = self
            .data
            .links_for_region(&region.code)
            .into_iter()
            .map(|link| {
                let [a, b] = link.bounds;
                LinkArea {
                    id: link.id.clone(),
                    bounds: projection.unproject_rect(a, b),
                    image_url: self.images.get(&link.id).cloned(),
                }
            })
            .collect();
        layers.attach(LayerId::Links);
        log::debug!("{} link areas for {}", self.areas.len(), region.code);
    }

    pub fn set_data(&mut self, data: LinkData, region: Option<&Region>, layers: &mut LayerManager) {
        self.data = data;
        if let Some(region) = region {
            self.rebuild(region, layers);
        }
    }

    /// Hit-tests the pointer. Entering a link shows its tooltip and cancels a
    /// pending hide; leaving schedules the hide.
    pub fn pointer_move(&mut self, position: &LatLng) -> Option<&LinkArea> {
        let hit = self
            .areas
            .iter()
            .position(|area| area.bounds.contains(position));

        match hit {
            Some(index) => {
                let area = &self.areas[index];
                self.hide.cancel(&());
                if self.hovered.as_deref() != Some(area.id.as_str()) {
                    self.hovered = Some(area.id.clone());
                    self.tooltip = Some(LinkTooltip {
                        link_id: area.id.clone(),
                        anchor: LatLng::new(area.bounds.north(), area.bounds.center().lng),
                        config: self.data.config.clone(),
                    });
                }
                self.areas.get(index)
            }
            None => {
                if self.hovered.take().is_some() {
                    self.hide.schedule((), (), self.clock.now());
                }
                None
            }
        }
    }

    /// Tooltip position in container pixels, above the link's top edge
    pub fn tooltip_position(&self, viewport: &Viewport) -> Option<Point> {
        let tooltip = self.tooltip.as_ref()?;
        let point = viewport.lat_lng_to_pixel(&tooltip.anchor);
        Some(Point::new(point.x, point.y - TOOLTIP_OFFSET))
    }

    pub fn tick(&mut self) {
        if !self.hide.take_due(self.clock.now()).is_empty() && self.hovered.is_none() {
            self.tooltip = None;
        }
    }
}

impl LayerTrait for LinkOverlay {
    impl_layer_trait!(properties);
}
