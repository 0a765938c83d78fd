use crate::core::geo::TileCoord;

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;
}

/// A URL with `{z}`, `{x}` and `{y}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    template: String,
}

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}

impl TileSource for UrlTemplate {
    fn url(&self, coord: TileCoord) -> String {
        self.template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }
}

/// Resolves the tile URL template for a region and optional secondary skin
pub trait TileUrlProvider: Send + Sync {
    fn template(&self, region: &str, skin: Option<&str>) -> UrlTemplate;
}

/// Tiles served from the asset host as `/clips/{region}/{z}/{x}_{y}.webp`.
///
/// Secondary skins live next to the base set with a lowercase suffix, e.g.
/// `/clips/Valley_4_b1/...` for skin `B1`.
#[derive(Debug, Clone, Default)]
pub struct AssetTileUrls {
    host: String,
}

impl AssetTileUrls {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl TileUrlProvider for AssetTileUrls {
    fn template(&self, region: &str, skin: Option<&str>) -> UrlTemplate {
        let suffix = match skin {
            Some(skin) if !skin.eq_ignore_ascii_case(crate::layers::tile::BASE_SKIN) => {
                format!("_{}", skin.to_lowercase())
            }
            _ => String::new(),
        };
        UrlTemplate::new(format!(
            "{}/clips/{}{}/{{z}}/{{x}}_{{y}}.webp",
            self.host, region, suffix
        ))
    }
}

impl<F> TileUrlProvider for F
where
    F: Fn(&str, Option<&str>) -> String + Send + Sync,
{
    fn template(&self, region: &str, skin: Option<&str>) -> UrlTemplate {
        UrlTemplate::new(self(region, skin))
    }
}
