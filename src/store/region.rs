//! Current region and subregion selection.

use crate::core::constants::DEFAULT_REGION;
use crate::store::storage::{load_or_default, save_json, Storage};
use crate::Result;
use serde::{Deserialize, Serialize};

pub const REGION_STORE_KEY: &str = "region-storage";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionStore {
    current_region_key: String,
    #[serde(default)]
    current_subregion_key: Option<String>,
    /// Consumed once by the session; never persisted
    #[serde(skip)]
    subregion_switch_request: Option<String>,
}

impl Default for RegionStore {
    fn default() -> Self {
        Self {
            current_region_key: DEFAULT_REGION.to_string(),
            current_subregion_key: None,
            subregion_switch_request: None,
        }
    }
}

impl RegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(storage: &dyn Storage) -> Self {
        load_or_default(storage, REGION_STORE_KEY)
    }

    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        save_json(storage, REGION_STORE_KEY, self)
    }

    pub fn current_region(&self) -> &str {
        &self.current_region_key
    }

    pub fn current_subregion(&self) -> Option<&str> {
        self.current_subregion_key.as_deref()
    }

    /// Selecting a region forgets the selected subregion
    pub fn set_current_region(&mut self, region: impl Into<String>) {
        self.current_region_key = region.into();
        self.current_subregion_key = None;
    }

    pub fn set_current_subregion(&mut self, subregion: impl Into<String>) {
        self.current_subregion_key = Some(subregion.into());
    }

    pub fn request_subregion_switch(&mut self, subregion: impl Into<String>) {
        self.subregion_switch_request = Some(subregion.into());
    }

    pub fn has_switch_request(&self) -> bool {
        self.subregion_switch_request.is_some()
    }

    pub fn take_subregion_switch_request(&mut self) -> Option<String> {
        self.subregion_switch_request.take()
    }
}
