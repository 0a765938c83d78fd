//! Last camera position per region.

use crate::core::geo::LatLng;
use crate::store::storage::{load_or_default, save_json, Storage};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const VIEW_STATE_KEY: &str = "map-view-states";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub lat: f64,
    pub lng: f64,
    pub zoom: f64,
}

impl ViewState {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self {
            lat: center.lat,
            lng: center.lng,
            zoom,
        }
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

pub trait ViewStateStore: Send {
    fn get_view_state(&self, region: &str) -> Option<ViewState>;
    fn save_view_state(&mut self, region: &str, view: ViewState) -> Result<()>;
    fn clear_all(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewStates {
    #[serde(default)]
    view_states: BTreeMap<String, ViewState>,
}

/// View states that live as long as the process
#[derive(Debug, Clone, Default)]
pub struct MemoryViewStates {
    states: BTreeMap<String, ViewState>,
}

impl MemoryViewStates {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ViewStateStore for MemoryViewStates {
    fn get_view_state(&self, region: &str) -> Option<ViewState> {
        self.states.get(region).copied()
    }

    fn save_view_state(&mut self, region: &str, view: ViewState) -> Result<()> {
        self.states.insert(region.to_string(), view);
        Ok(())
    }

    fn clear_all(&mut self) -> Result<()> {
        self.states.clear();
        Ok(())
    }
}

/// View states written through to a [`Storage`] on every save
pub struct PersistentViewStates {
    storage: Arc<dyn Storage>,
    states: ViewStates,
}

impl std::fmt::Debug for PersistentViewStates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentViewStates")
            .field("regions", &self.states.view_states.len())
            .finish()
    }
}

impl PersistentViewStates {
    /// Restores whatever was saved under [`VIEW_STATE_KEY`]
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let states = load_or_default(storage.as_ref(), VIEW_STATE_KEY);
        Self { storage, states }
    }
}

impl ViewStateStore for PersistentViewStates {
    fn get_view_state(&self, region: &str) -> Option<ViewState> {
        self.states.view_states.get(region).copied()
    }

    fn save_view_state(&mut self, region: &str, view: ViewState) -> Result<()> {
        self.states.view_states.insert(region.to_string(), view);
        save_json(self.storage.as_ref(), VIEW_STATE_KEY, &self.states)
    }

    fn clear_all(&mut self) -> Result<()> {
        self.states.view_states.clear();
        self.storage.remove(VIEW_STATE_KEY).map(|_| ())
    }
}
