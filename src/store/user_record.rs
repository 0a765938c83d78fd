//! Points the user has marked as collected.

use crate::store::storage::{load_or_default, save_json, Storage};
use crate::Result;
use serde::{Deserialize, Serialize};

pub const POINTS_STORE_KEY: &str = "points-storage";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    active_points: Vec<String>,
}

impl UserRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(storage: &dyn Storage) -> Self {
        load_or_default(storage, POINTS_STORE_KEY)
    }

    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        save_json(storage, POINTS_STORE_KEY, self)
    }

    pub fn points(&self) -> &[String] {
        &self.active_points
    }

    pub fn contains(&self, id: &str) -> bool {
        self.active_points.iter().any(|point| point == id)
    }

    /// Returns false if the point was already collected
    pub fn add_point(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.active_points.push(id.to_string());
        true
    }

    pub fn delete_point(&mut self, id: &str) -> bool {
        let before = self.active_points.len();
        self.active_points.retain(|point| point != id);
        before != self.active_points.len()
    }

    pub fn set_points<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_points.clear();
        for id in ids {
            let id = id.into();
            if !self.active_points.contains(&id) {
                self.active_points.push(id);
            }
        }
    }

    pub fn clear_points(&mut self) {
        self.active_points.clear();
    }
}
