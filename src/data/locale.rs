//! Locale lookup used to resolve label text.

use serde_json::Value;

/// Read access to a nested locale bundle addressed by dotted keys
pub trait LocaleLookup: Send + Sync {
    /// String value at `key`
    fn text(&self, key: &str) -> Option<String>;

    /// Whether `key` addresses an object node
    fn has_branch(&self, key: &str) -> bool;
}

/// Locale bundle backed by a JSON tree
#[derive(Debug, Clone, Default)]
pub struct JsonLocale {
    root: Value,
}

impl JsonLocale {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    fn node(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(&self.root, |node, segment| node.get(segment))
    }
}

impl LocaleLookup for JsonLocale {
    fn text(&self, key: &str) -> Option<String> {
        self.node(key)
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }

    fn has_branch(&self, key: &str) -> bool {
        self.node(key).map_or(false, Value::is_object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_lookup() {
        let locale = JsonLocale::from_json_str(
            r#"{"game":{"region":{"VL":{"sub":{"HB":{"name":"Hub","site":{"gate":"Gate"}}}}}}}"#,
        )
        .unwrap();
        assert_eq!(locale.text("game.region.VL.sub.HB.name").as_deref(), Some("Hub"));
        assert_eq!(locale.text("game.region.VL.sub.HB.site.gate").as_deref(), Some("Gate"));
        assert!(locale.text("game.region.VL.sub.HB").is_none());
        assert!(locale.has_branch("game.region.VL.sub.HB.site"));
        assert!(!locale.has_branch("game.region.WL"));
    }
}
