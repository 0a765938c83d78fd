//! Region labels.
//!
//! Coarse subregion names are shown when zoomed out and place names when
//! zoomed in. Regions whose locale bundle is flat, or whose data has no
//! subregion labels, always show place names. Switching level fades the old
//! labels out before the new ones appear.

use crate::animation::FadeScheduler;
use crate::constants::LABEL_ZOOM_THRESHOLD;
use crate::core::clock::Clock;
use crate::core::config::Region;
use crate::core::geo::LatLng;
use crate::core::projection::Projection;
use crate::data::label::{Label, LabelData};
use crate::data::locale::LocaleLookup;
use crate::layers::base::{LayerId, LayerProperties, LayerTrait, LayerType};
use crate::layers::manager::LayerManager;
use crate::prelude::{Arc, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub use crate::data::label::LabelKind;

/// How a region's locale keys are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStructure {
    /// `game.region.{code}.sub.{sub}.name` / `.site.{site}`
    Nested,
    /// `game.region.{code}.sub.name` / `.sub.site.{site}`
    Flat,
}

impl LabelStructure {
    pub fn detect(locale: &dyn LocaleLookup, code: &str) -> Self {
        let base = format!("game.region.{}.sub", code);
        if locale.text(&format!("{}.name", base)).is_some()
            && locale.has_branch(&format!("{}.site", base))
        {
            LabelStructure::Flat
        } else {
            LabelStructure::Nested
        }
    }
}

/// Resolved label text with a raw-key fallback
pub fn resolve_label_text(locale: &dyn LocaleLookup, code: &str, structure: LabelStructure, label: &Label) -> String {
    let site = label.site.as_deref().unwrap_or_default();
    match (structure, label.kind) {
        (LabelStructure::Flat, LabelKind::Sub) => locale
            .text(&format!("game.region.{}.sub.name", code))
            .unwrap_or_else(|| code.to_string()),
        (LabelStructure::Flat, LabelKind::Site) => locale
            .text(&format!("game.region.{}.sub.site.{}", code, site))
            .unwrap_or_else(|| site.to_string()),
        (LabelStructure::Nested, LabelKind::Sub) => locale
            .text(&format!("game.region.{}.sub.{}.name", code, label.sub))
            .unwrap_or_else(|| label.sub.clone()),
        (LabelStructure::Nested, LabelKind::Site) => locale
            .text(&format!("game.region.{}.sub.{}.site.{}", code, label.sub, site))
            .unwrap_or_else(|| site.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLabel {
    pub id: String,
    pub kind: LabelKind,
    pub text: String,
    pub position: LatLng,
    pub fading: bool,
}

#[derive(Debug, Clone)]
struct RegionContext {
    code: String,
    projection: Projection,
    structure: LabelStructure,
}

pub struct LabelOverlay {
    properties: LayerProperties,
    data: LabelData,
    index: HashMap<String, Vec<Label>>,
    locale: Arc<dyn LocaleLookup>,
    tool_mounted: Arc<AtomicBool>,
    clock: Arc<dyn Clock>,
    enabled: bool,
    region: Option<RegionContext>,
    shown: Option<LabelKind>,
    rendered: Vec<RenderedLabel>,
    swap: FadeScheduler<(), LabelKind>,
}

impl std::fmt::Debug for LabelOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelOverlay")
            .field("region", &self.region)
            .field("shown", &self.shown)
            .field("rendered", &self.rendered.len())
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl LabelOverlay {
    pub fn new(
        data: LabelData,
        locale: Arc<dyn LocaleLookup>,
        tool_mounted: Arc<AtomicBool>,
        clock: Arc<dyn Clock>,
        fade: Duration,
    ) -> Self {
        Self {
            properties: LayerProperties::new(LayerId::Labels, LayerType::Label),
            data,
            index: HashMap::default(),
            locale,
            tool_mounted,
            clock,
            enabled: true,
            region: None,
            shown: None,
            rendered: Vec::new(),
            swap: FadeScheduler::new(fade),
        }
    }

    /// Flag the label editing tool sets while it owns the label pane
    pub fn tool_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.tool_mounted)
    }

    pub fn labels(&self) -> &[RenderedLabel] {
        &self.rendered
    }

    pub fn shown_kind(&self) -> Option<LabelKind> {
        self.shown
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn suppressed(&self) -> bool {
        !self.enabled || self.tool_mounted.load(Ordering::SeqCst)
    }

    fn region_labels(&mut self, code: &str) -> &[Label] {
        let data = &self.data;
        self.index
            .entry(code.to_string())
            .or_insert_with(|| data.labels_for_region(code).into_iter().cloned().collect())
    }

    fn kind_for_zoom(&mut self, zoom: f64) -> Option<LabelKind> {
        let (code, structure) = {
            let region = self.region.as_ref()?;
            (region.code.clone(), region.structure)
        };
        let has_sub = self
            .region_labels(&code)
            .iter()
            .any(|label| label.kind == LabelKind::Sub);
        if structure == LabelStructure::Flat || !has_sub {
            return Some(LabelKind::Site);
        }
        Some(if zoom <= LABEL_ZOOM_THRESHOLD {
            LabelKind::Sub
        } else {
            LabelKind::Site
        })
    }

    /// Full rebuild after the map tore down every layer
    pub fn on_region_switched(&mut self, region: &Region, zoom: f64, layers: &mut LayerManager) {
        let structure = LabelStructure::detect(self.locale.as_ref(), &region.code);
        self.region = Some(RegionContext {
            code: region.code.clone(),
            projection: region.projection(),
            structure,
        });
        self.force_render(zoom, layers);
    }

    /// Re-renders only when the level to show changes
    pub fn on_zoom_end(&mut self, zoom: f64, layers: &mut LayerManager) {
        if self.suppressed() {
            layers.detach(&LayerId::Labels);
            return;
        }
        let Some(kind) = self.kind_for_zoom(zoom) else {
            return;
        };
        if self.shown == Some(kind) {
            if self.swap.cancel(&()).is_some() {
                for label in &mut self.rendered {
                    label.fading = false;
                }
            }
            return;
        }
        if self.swap.payload(&()) == Some(&kind) {
            return;
        }
        if self.rendered.is_empty() {
            self.render(kind, layers);
            return;
        }
        for label in &mut self.rendered {
            label.fading = true;
        }
        self.swap.schedule((), kind, self.clock.now());
    }

    /// Finishes a pending level swap once the fade elapsed
    pub fn tick(&mut self, layers: &mut LayerManager) {
        let now = self.clock.now();
        if let Some(((), kind)) = self.swap.take_due(now).pop() {
            if self.suppressed() {
                layers.detach(&LayerId::Labels);
                return;
            }
            self.render(kind, layers);
        }
    }

    fn force_render(&mut self, zoom: f64, layers: &mut LayerManager) {
        self.swap.clear();
        self.shown = None;
        self.rendered.clear();
        if self.suppressed() {
            layers.detach(&LayerId::Labels);
            return;
        }
        if let Some(kind) = self.kind_for_zoom(zoom) {
            self.render(kind, layers);
        }
    }

    fn render(&mut self, kind: LabelKind, layers: &mut LayerManager) {
        let Some(region) = self.region.clone() else {
            return;
        };
        let locale = Arc::clone(&self.locale);
        let rendered: Vec<RenderedLabel> = self
            .region_labels(&region.code)
            .iter()
            .filter(|label| label.kind == kind)
            .map(|label| RenderedLabel {
                id: label.id.clone(),
                kind,
                text: resolve_label_text(locale.as_ref(), &region.code, region.structure, label),
                position: region.projection.unproject_xy(label.point),
                fading: false,
            })
            .collect();
        log::debug!("{} {:?} labels for {}", rendered.len(), kind, region.code);
        self.rendered = rendered;
        self.shown = Some(kind);
        layers.attach(LayerId::Labels);
    }

    pub fn set_enabled(&mut self, enabled: bool, zoom: f64, layers: &mut LayerManager) {
        self.enabled = enabled;
        self.force_render(zoom, layers);
    }

    /// Re-checks the tool flag, e.g. after the tool mounted or unmounted
    pub fn refresh(&mut self, zoom: f64, layers: &mut LayerManager) {
        self.force_render(zoom, layers);
    }

    pub fn set_locale(&mut self, locale: Arc<dyn LocaleLookup>, zoom: f64, layers: &mut LayerManager) {
        self.locale = locale;
        if let Some(region) = self.region.as_mut() {
            region.structure = LabelStructure::detect(self.locale.as_ref(), &region.code);
        }
        self.force_render(zoom, layers);
    }

    pub fn set_data(&mut self, data: LabelData, zoom: f64, layers: &mut LayerManager) {
        self.data = data;
        self.index.clear();
        self.force_render(zoom, layers);
    }
}

impl LayerTrait for LabelOverlay {
    impl_layer_trait!(properties);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::config::RegionConfig;
    use crate::data::locale::JsonLocale;

    fn region() -> Region {
        let config: RegionConfig = serde_json::from_str(
            r#"{"dimensions":[8000,10000],"tileSize":200,"maxZoom":3,"initialOffset":{"x":750,"y":250},"initialZoom":2}"#,
        )
        .unwrap();
        config.validated("Valley_4").unwrap()
    }

    fn data() -> LabelData {
        LabelData::try_parse(
            r#"{"version":1,"regions":{"VL":{"labels":{
                "VL/HB":{"id":"VL/HB","type":"sub","region":"VL","sub":"HB","point":[800,800]},
                "VL/HB/gate":{"id":"VL/HB/gate","type":"site","region":"VL","sub":"HB","site":"gate","point":[80,80]}
            }}}}"#,
        )
        .unwrap()
    }

    fn overlay(clock: &ManualClock) -> LabelOverlay {
        let locale = JsonLocale::from_json_str(
            r#"{"game":{"region":{"VL":{"sub":{"HB":{"name":"Hub","site":{"gate":"Gate"}}}}}}}"#,
        )
        .unwrap();
        LabelOverlay::new(
            data(),
            Arc::new(locale),
            Arc::new(AtomicBool::new(false)),
            Arc::new(clock.clone()),
            Duration::from_millis(200),
        )
    }

    #[test]
    fn test_level_follows_zoom_with_fade() {
        let clock = ManualClock::new();
        let mut labels = overlay(&clock);
        let mut layers = LayerManager::new();

        labels.on_region_switched(&region(), 0.0, &mut layers);
        assert_eq!(labels.shown_kind(), Some(LabelKind::Sub));
        assert_eq!(labels.labels()[0].text, "Hub");
        assert_eq!(labels.labels()[0].position, LatLng::new(-100.0, 100.0));
        assert!(layers.is_attached(&LayerId::Labels));

        labels.on_zoom_end(1.0, &mut layers);
        assert_eq!(labels.shown_kind(), Some(LabelKind::Sub));
        assert!(labels.labels().iter().all(|l| l.fading));

        clock.advance_ms(200);
        labels.tick(&mut layers);
        assert_eq!(labels.shown_kind(), Some(LabelKind::Site));
        assert_eq!(labels.labels()[0].text, "Gate");
    }

    #[test]
    fn test_zooming_back_cancels_pending_swap() {
        let clock = ManualClock::new();
        let mut labels = overlay(&clock);
        let mut layers = LayerManager::new();
        labels.on_region_switched(&region(), 0.0, &mut layers);

        labels.on_zoom_end(1.0, &mut layers);
        assert!(labels.labels().iter().all(|l| l.fading));
        clock.advance_ms(50);
        labels.on_zoom_end(0.0, &mut layers);
        assert!(labels.labels().iter().all(|l| !l.fading));

        clock.advance_ms(200);
        labels.tick(&mut layers);
        assert_eq!(labels.shown_kind(), Some(LabelKind::Sub));
        assert_eq!(labels.labels()[0].text, "Hub");
    }

    #[test]
    fn test_tool_flag_suppresses_labels() {
        let clock = ManualClock::new();
        let mut labels = overlay(&clock);
        let mut layers = LayerManager::new();
        labels.tool_flag().store(true, Ordering::SeqCst);
        labels.on_region_switched(&region(), 0.0, &mut layers);
        assert!(labels.labels().is_empty());
        assert!(!layers.is_attached(&LayerId::Labels));

        labels.tool_flag().store(false, Ordering::SeqCst);
        labels.refresh(0.0, &mut layers);
        assert!(layers.is_attached(&LayerId::Labels));
    }

    #[test]
    fn test_flat_structure_and_fallback() {
        let flat = JsonLocale::from_json_str(
            r#"{"game":{"region":{"DJ":{"sub":{"name":"Dijiang","site":{"dock":"Dock"}}}}}}"#,
        )
        .unwrap();
        assert_eq!(LabelStructure::detect(&flat, "DJ"), LabelStructure::Flat);

        let label = Label {
            id: "DJ/x/pier".into(),
            kind: LabelKind::Site,
            region: "DJ".into(),
            sub: "x".into(),
            site: Some("pier".into()),
            point: [0.0, 0.0],
        };
        assert_eq!(resolve_label_text(&flat, "DJ", LabelStructure::Flat, &label), "pier");
    }
}
