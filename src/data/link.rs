//! Link hotspot data: square areas that open external pages.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const LINK_DATA_VERSION: u32 = crate::constants::OVERLAY_DATA_VERSION;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkTarget {
    /// Locale key of the tooltip title
    #[serde(default)]
    pub title_key: String,
    #[serde(default)]
    pub url: String,
}

/// Tooltip targets shared by every link area
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalLinkConfig {
    #[serde(default)]
    pub left_link: LinkTarget,
    #[serde(default)]
    pub right_link: LinkTarget,
}

/// One clickable square; `bounds` is in region pixel space at max zoom
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLink {
    pub id: String,
    pub region: String,
    pub bounds: [[f64; 2]; 2],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkBucket {
    pub links: BTreeMap<String, MapLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkData {
    pub version: u32,
    #[serde(default)]
    pub config: GlobalLinkConfig,
    pub regions: BTreeMap<String, LinkBucket>,
}

impl Default for LinkData {
    fn default() -> Self {
        Self {
            version: LINK_DATA_VERSION,
            config: GlobalLinkConfig::default(),
            regions: BTreeMap::new(),
        }
    }
}

/// Rounds both corners to three decimals
pub fn round_bounds(bounds: [[f64; 2]; 2]) -> [[f64; 2]; 2] {
    let round3 = |n: f64| (n * 1000.0).round() / 1000.0;
    [
        [round3(bounds[0][0]), round3(bounds[0][1])],
        [round3(bounds[1][0]), round3(bounds[1][1])],
    ]
}

impl LinkData {
    /// Parses link JSON; malformed links are skipped, a wrong version yields `None`
    pub fn try_parse(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text).ok()?;
        if value.get("version").and_then(Value::as_u64) != Some(LINK_DATA_VERSION as u64) {
            return None;
        }

        let config = value
            .get("config")
            .cloned()
            .and_then(|raw| serde_json::from_value(raw).ok())
            .unwrap_or_default();
        let mut data = Self {
            config,
            ..Self::default()
        };

        if let Some(regions) = value.get("regions").and_then(Value::as_object) {
            for (region, bucket) in regions {
                let mut links = BTreeMap::new();
                if let Some(raw_links) = bucket.get("links").and_then(Value::as_object) {
                    for (id, raw) in raw_links {
                        match serde_json::from_value::<MapLink>(raw.clone()) {
                            Ok(mut link) => {
                                link.bounds = round_bounds(link.bounds);
                                links.insert(id.clone(), link);
                            }
                            Err(err) => log::warn!("dropping malformed link {}/{}: {}", region, id, err),
                        }
                    }
                }
                data.regions.insert(region.clone(), LinkBucket { links });
            }
        }
        Some(data)
    }

    /// Union of both region sets; `overlay` wins per link id and supplies the config
    pub fn merge(base: &LinkData, overlay: &LinkData) -> LinkData {
        let mut merged = LinkData {
            version: LINK_DATA_VERSION,
            config: overlay.config.clone(),
            regions: base.regions.clone(),
        };
        for (region, bucket) in &overlay.regions {
            let target = merged.regions.entry(region.clone()).or_default();
            for (id, link) in &bucket.links {
                target.links.insert(id.clone(), link.clone());
            }
        }
        merged
    }

    pub fn links_for_region(&self, code: &str) -> Vec<&MapLink> {
        self.regions
            .get(code)
            .map(|bucket| bucket.links.values().collect())
            .unwrap_or_default()
    }

    pub fn to_json_string(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)? + "\n")
    }
}
