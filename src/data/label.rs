//! Map label data: versioned per-region point labels.
//!
//! Labels come in two levels. `Sub` labels name a whole subregion and are
//! shown when zoomed out; `Site` labels name places inside a subregion.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const LABEL_DATA_VERSION: u32 = crate::constants::OVERLAY_DATA_VERSION;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    Sub,
    Site,
}

/// One label; `point` is in region pixel space at max zoom
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    /// Stable id such as `VL/HB` or `VL/OL/originium_passage`
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LabelKind,
    pub region: String,
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    pub point: [f64; 2],
}

impl Label {
    fn is_well_formed(&self) -> bool {
        self.kind == LabelKind::Sub || self.site.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelBucket {
    pub labels: BTreeMap<String, Label>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelData {
    pub version: u32,
    pub regions: BTreeMap<String, LabelBucket>,
}

impl Default for LabelData {
    fn default() -> Self {
        Self {
            version: LABEL_DATA_VERSION,
            regions: BTreeMap::new(),
        }
    }
}

impl LabelData {
    /// Parses label JSON, keeping only well-formed labels.
    ///
    /// Returns `None` for invalid JSON or a version other than 1.
    pub fn try_parse(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text).ok()?;
        if value.get("version").and_then(Value::as_u64) != Some(LABEL_DATA_VERSION as u64) {
            return None;
        }
        Some(Self::sanitize(&value))
    }

    fn sanitize(value: &Value) -> Self {
        let mut data = Self::default();
        let Some(regions) = value.get("regions").and_then(Value::as_object) else {
            return data;
        };
        for (region, bucket) in regions {
            let Some(labels) = bucket.get("labels").and_then(Value::as_object) else {
                continue;
            };
            let mut kept = BTreeMap::new();
            for (id, raw) in labels {
                match serde_json::from_value::<Label>(raw.clone()) {
                    Ok(label) if label.is_well_formed() => {
                        kept.insert(id.clone(), label);
                    }
                    _ => log::warn!("dropping malformed label {}/{}", region, id),
                }
            }
            data.regions.insert(region.clone(), LabelBucket { labels: kept });
        }
        data
    }

    /// Per-label-id merge; `incoming` wins
    pub fn merge(base: &LabelData, incoming: &LabelData) -> LabelData {
        let mut merged = base.clone();
        merged.version = LABEL_DATA_VERSION;
        for (region, bucket) in &incoming.regions {
            let target = merged.regions.entry(region.clone()).or_default();
            for (id, label) in &bucket.labels {
                target.labels.insert(id.clone(), label.clone());
            }
        }
        merged
    }

    pub fn labels_for_region(&self, code: &str) -> Vec<&Label> {
        self.regions
            .get(code)
            .map(|bucket| bucket.labels.values().collect())
            .unwrap_or_default()
    }

    pub fn has_kind(&self, code: &str, kind: LabelKind) -> bool {
        self.labels_for_region(code).iter().any(|label| label.kind == kind)
    }

    /// Pretty JSON with a trailing newline
    pub fn to_json_string(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)? + "\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "version": 1,
        "regions": {
            "VL": { "labels": {
                "VL/HB": {"id":"VL/HB","type":"sub","region":"VL","sub":"HB","point":[100,200]},
                "VL/HB/gate": {"id":"VL/HB/gate","type":"site","region":"VL","sub":"HB","site":"gate","point":[10,20]},
                "VL/bad": {"id":"VL/bad","type":"site","region":"VL","sub":"HB","point":[1,2]}
            }}
        }
    }"#;

    #[test]
    fn test_try_parse_drops_malformed() {
        let data = LabelData::try_parse(SAMPLE).unwrap();
        assert_eq!(data.labels_for_region("VL").len(), 2);
        assert!(data.has_kind("VL", LabelKind::Sub));
        assert!(data.labels_for_region("WL").is_empty());
    }

    #[test]
    fn test_try_parse_rejects_other_versions() {
        assert!(LabelData::try_parse(r#"{"version":2,"regions":{}}"#).is_none());
        assert!(LabelData::try_parse("not json").is_none());
    }

    #[test]
    fn test_merge_incoming_wins() {
        let base = LabelData::try_parse(SAMPLE).unwrap();
        let incoming = LabelData::try_parse(
            r#"{"version":1,"regions":{"VL":{"labels":{"VL/HB":{"id":"VL/HB","type":"sub","region":"VL","sub":"HB","point":[5,5]}}}}}"#,
        )
        .unwrap();
        let merged = LabelData::merge(&base, &incoming);
        let labels = merged.labels_for_region("VL");
        assert_eq!(labels.len(), 2);
        assert_eq!(merged.regions["VL"].labels["VL/HB"].point, [5.0, 5.0]);
    }
}
