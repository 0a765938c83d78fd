use crate::core::geo::Point;
use std::collections::BTreeMap;

/// A group of nearby items on screen
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Stable id derived from the grid cell
    pub id: String,
    /// Mean position of the members, in the same pixel space as the input
    pub center: Point,
    pub item_ids: Vec<String>,
}

impl Cluster {
    pub fn count(&self) -> usize {
        self.item_ids.len()
    }

    pub fn is_single(&self) -> bool {
        self.item_ids.len() == 1
    }
}

/// Grid-based clustering settings
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringConfig {
    /// Cell size in pixels
    pub grid_size: f64,
    /// At or above this zoom every item is its own cluster
    pub disable_clustering_at_zoom: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            grid_size: crate::constants::MAX_CLUSTER_RADIUS,
            disable_clustering_at_zoom: crate::constants::DISABLE_CLUSTERING_AT_ZOOM,
        }
    }
}

/// Buckets projected items into grid cells.
///
/// `items` are `(id, pixel position at zoom)` pairs; output order follows the
/// grid cells (row-major) so repeated calls produce the same clusters.
pub fn grid_cluster(config: &ClusteringConfig, items: &[(String, Point)], zoom: f64) -> Vec<Cluster> {
    if zoom >= config.disable_clustering_at_zoom {
        return items
            .iter()
            .map(|(id, point)| Cluster {
                id: format!("single_{}", id),
                center: *point,
                item_ids: vec![id.clone()],
            })
            .collect();
    }

    let mut cells: BTreeMap<(i64, i64), Vec<&(String, Point)>> = BTreeMap::new();
    for item in items {
        let grid_x = (item.1.x / config.grid_size).floor() as i64;
        let grid_y = (item.1.y / config.grid_size).floor() as i64;
        cells.entry((grid_y, grid_x)).or_default().push(item);
    }

    cells
        .into_iter()
        .map(|((grid_y, grid_x), members)| {
            let n = members.len() as f64;
            let sum = members
                .iter()
                .fold(Point::new(0.0, 0.0), |acc, (_, p)| acc.add(p));
            Cluster {
                id: format!("cluster_{}_{}", grid_x, grid_y),
                center: sum.multiply(1.0 / n),
                item_ids: members.iter().map(|(id, _)| id.clone()).collect(),
            }
        })
        .collect()
}
