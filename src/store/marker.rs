//! Marker filter and selection.

use crate::store::storage::{load_or_default, save_json, Storage};
use crate::Result;
use serde::{Deserialize, Serialize};

pub const MARKER_FILTER_KEY: &str = "marker-filter";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStore {
    #[serde(default)]
    filter: Vec<String>,
    #[serde(skip)]
    selected: Vec<String>,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(storage: &dyn Storage) -> Self {
        load_or_default(storage, MARKER_FILTER_KEY)
    }

    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        save_json(storage, MARKER_FILTER_KEY, self)
    }

    pub fn filter(&self) -> &[String] {
        &self.filter
    }

    /// Adds or removes a type, keeping insertion order; returns whether it is now on
    pub fn switch_filter(&mut self, type_key: &str) -> bool {
        if let Some(index) = self.filter.iter().position(|key| key == type_key) {
            self.filter.remove(index);
            false
        } else {
            self.filter.push(type_key.to_string());
            true
        }
    }

    pub fn set_filter<I, S>(&mut self, types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter.clear();
        for type_key in types {
            let type_key = type_key.into();
            if !self.filter.contains(&type_key) {
                self.filter.push(type_key);
            }
        }
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn set_selected(&mut self, ids: Vec<String>) {
        self.selected = ids;
    }

    /// Appends ids not already selected
    pub fn extend_selected<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        for id in ids {
            if !self.selected.contains(&id) {
                self.selected.push(id);
            }
        }
    }

    pub fn remove_selected(&mut self, ids: &[String]) {
        self.selected.retain(|id| !ids.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_filter_toggles() {
        let mut store = MarkerStore::new();
        assert!(store.switch_filter("ore"));
        assert!(store.switch_filter("chest"));
        assert!(!store.switch_filter("ore"));
        assert_eq!(store.filter(), ["chest".to_string()]);
    }

    #[test]
    fn test_selection_helpers() {
        let mut store = MarkerStore::new();
        store.extend_selected(vec!["a".to_string(), "b".to_string()]);
        store.extend_selected(vec!["b".to_string(), "c".to_string()]);
        assert_eq!(store.selected().len(), 3);
        store.remove_selected(&["a".to_string()]);
        assert_eq!(store.selected(), ["b".to_string(), "c".to_string()]);
    }
}
