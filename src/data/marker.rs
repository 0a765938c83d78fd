//! Marker records, the type catalog and the per-subregion dataset.

use crate::core::config::Region;
use crate::core::geo::LatLng;
use crate::prelude::{HashMap, HashSet};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One placed marker as shipped in the dataset bundles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerRecord {
    pub id: String,
    /// Map coordinates as `[lat, lng]`
    pub position: [f64; 2],
    pub subregion_id: String,
    #[serde(rename = "type")]
    pub type_key: String,
}

impl MarkerRecord {
    pub fn new(
        id: impl Into<String>,
        position: [f64; 2],
        subregion_id: impl Into<String>,
        type_key: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            position,
            subregion_id: subregion_id.into(),
            type_key: type_key.into(),
        }
    }

    pub fn lat_lng(&self) -> LatLng {
        LatLng::new(self.position[0], self.position[1])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerCategory {
    pub main: String,
    pub sub: String,
}

/// Catalog entry describing how a marker type is drawn and grouped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerType {
    pub key: String,
    pub category: MarkerCategory,
    #[serde(default)]
    pub no_frame: bool,
    #[serde(default)]
    pub sub_icon: Option<String>,
}

impl MarkerType {
    pub fn new(key: impl Into<String>, main: impl Into<String>, sub: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            category: MarkerCategory {
                main: main.into(),
                sub: sub.into(),
            },
            no_frame: false,
            sub_icon: None,
        }
    }

    pub fn with_no_frame(mut self) -> Self {
        self.no_frame = true;
        self
    }

    pub fn with_sub_icon(mut self, sub_icon: impl Into<String>) -> Self {
        self.sub_icon = Some(sub_icon.into());
        self
    }

    /// Types whose main category is aggregated into per-type cluster groups
    pub fn is_cluster_eligible(&self) -> bool {
        crate::constants::CLUSTER_CATEGORIES.contains(&self.category.main.as_str())
    }
}

/// All known marker types, keyed by type key
#[derive(Debug, Clone, Default)]
pub struct MarkerTypeCatalog {
    types: BTreeMap<String, MarkerType>,
}

impl MarkerTypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the `{ key: MarkerType }` dictionary format
    pub fn from_json_str(json: &str) -> Result<Self> {
        let types: BTreeMap<String, MarkerType> = serde_json::from_str(json)?;
        Ok(Self { types })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn insert(&mut self, marker_type: MarkerType) {
        self.types.insert(marker_type.key.clone(), marker_type);
    }

    pub fn get(&self, key: &str) -> Option<&MarkerType> {
        self.types.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.types.contains_key(key)
    }

    pub fn is_cluster_eligible(&self, key: &str) -> bool {
        self.get(key).map_or(false, MarkerType::is_cluster_eligible)
    }

    pub fn cluster_eligible_types(&self) -> impl Iterator<Item = &MarkerType> {
        self.types.values().filter(|t| t.is_cluster_eligible())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MarkerType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// `main → sub → [type]`, used by filter pickers
    pub fn category_tree(&self) -> BTreeMap<String, BTreeMap<String, Vec<&MarkerType>>> {
        let mut tree: BTreeMap<String, BTreeMap<String, Vec<&MarkerType>>> = BTreeMap::new();
        for marker_type in self.types.values() {
            tree.entry(marker_type.category.main.clone())
                .or_default()
                .entry(marker_type.category.sub.clone())
                .or_default()
                .push(marker_type);
        }
        tree
    }
}

/// Collected-vs-total for one type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionProgress {
    pub collected: usize,
    pub total: usize,
}

impl CollectionProgress {
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.collected >= self.total
    }
}

/// Static marker bundles grouped by subregion, with precomputed type counts
#[derive(Debug, Clone, Default)]
pub struct MarkerDataset {
    subregions: BTreeMap<String, Vec<MarkerRecord>>,
    subregion_counts: HashMap<String, HashMap<String, usize>>,
    world_counts: HashMap<String, usize>,
}

impl MarkerDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_subregions(subregions: impl IntoIterator<Item = (String, Vec<MarkerRecord>)>) -> Self {
        let mut dataset = Self::new();
        for (subregion, records) in subregions {
            dataset.insert_subregion(subregion, records);
        }
        dataset
    }

    /// Loads every `*.json` file in `dir`; the file stem is the subregion id
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut dataset = Self::new();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let stem = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .ok_or_else(|| MapError::Data(format!("invalid marker file name: {}", path.display())))?
                .to_string();
            let text = std::fs::read_to_string(&path)?;
            let records: Vec<MarkerRecord> = serde_json::from_str(&text)?;
            log::debug!("loaded {} markers for {}", records.len(), stem);
            dataset.insert_subregion(stem, records);
        }
        Ok(dataset)
    }

    /// Replaces the records of one subregion and refreshes the counts
    pub fn insert_subregion(&mut self, subregion: impl Into<String>, records: Vec<MarkerRecord>) {
        let subregion = subregion.into();
        if let Some(previous) = self.subregions.remove(&subregion) {
            for record in &previous {
                if let Some(count) = self.world_counts.get_mut(&record.type_key) {
                    *count = count.saturating_sub(1);
                }
            }
        }

        let mut counts: HashMap<String, usize> = HashMap::default();
        for record in &records {
            *counts.entry(record.type_key.clone()).or_insert(0) += 1;
            *self.world_counts.entry(record.type_key.clone()).or_insert(0) += 1;
        }
        self.world_counts.retain(|_, count| *count > 0);
        self.subregion_counts.insert(subregion.clone(), counts);
        self.subregions.insert(subregion, records);
    }

    pub fn subregion(&self, subregion: &str) -> &[MarkerRecord] {
        self.subregions
            .get(subregion)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn subregion_ids(&self) -> impl Iterator<Item = &str> {
        self.subregions.keys().map(String::as_str)
    }

    /// Every record, subregion by subregion
    pub fn world(&self) -> impl Iterator<Item = &MarkerRecord> {
        self.subregions.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.subregions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subregion_type_count(&self, subregion: &str, type_key: &str) -> usize {
        self.subregion_counts
            .get(subregion)
            .and_then(|counts| counts.get(type_key))
            .copied()
            .unwrap_or(0)
    }

    pub fn region_type_count(&self, region: &Region, type_key: &str) -> usize {
        region
            .subregions
            .iter()
            .map(|subregion| self.subregion_type_count(subregion, type_key))
            .sum()
    }

    /// Type counts summed over the region's subregions
    pub fn region_counts(&self, region: &Region) -> HashMap<String, usize> {
        let mut totals: HashMap<String, usize> = HashMap::default();
        for subregion in &region.subregions {
            if let Some(counts) = self.subregion_counts.get(subregion) {
                for (type_key, count) in counts {
                    *totals.entry(type_key.clone()).or_insert(0) += count;
                }
            }
        }
        totals
    }

    pub fn world_type_count(&self, type_key: &str) -> usize {
        self.world_counts.get(type_key).copied().unwrap_or(0)
    }

    /// Progress for a type, optionally restricted to one region
    pub fn progress(
        &self,
        type_key: &str,
        region: Option<&Region>,
        collected: &HashSet<String>,
    ) -> CollectionProgress {
        let records: Vec<&MarkerRecord> = match region {
            Some(region) => region
                .subregions
                .iter()
                .flat_map(|subregion| self.subregion(subregion))
                .filter(|record| record.type_key == type_key)
                .collect(),
            None => self.world().filter(|record| record.type_key == type_key).collect(),
        };
        CollectionProgress {
            collected: records.iter().filter(|record| collected.contains(&record.id)).count(),
            total: records.len(),
        }
    }
}
