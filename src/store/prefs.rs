//! Map toggles that survive reloads.

use crate::layers::tile::{is_known_skin, BASE_SKIN};
use crate::store::storage::{load_or_default, save_json, Storage};
use crate::Result;
use serde::{Deserialize, Serialize};

pub const MAP_PREFS_KEY: &str = "map-prefs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapPrefs {
    pub hide_completed: bool,
    pub clustering: bool,
    pub boundaries: bool,
    pub labels: bool,
    /// Active tile skin, `M` for the base map
    pub layer: String,
}

impl Default for MapPrefs {
    fn default() -> Self {
        Self {
            hide_completed: false,
            clustering: false,
            boundaries: false,
            labels: true,
            layer: BASE_SKIN.to_string(),
        }
    }
}

impl MapPrefs {
    /// Loads the saved prefs; an unknown skin falls back to the base map
    pub fn load(storage: &dyn Storage) -> Self {
        let mut prefs: MapPrefs = load_or_default(storage, MAP_PREFS_KEY);
        if !is_known_skin(&prefs.layer) {
            log::warn!("unknown map layer {:?} in prefs, using {}", prefs.layer, BASE_SKIN);
            prefs.layer = BASE_SKIN.to_string();
        }
        prefs
    }

    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        save_json(storage, MAP_PREFS_KEY, self)
    }
}
