pub mod clustering;
pub mod index;

pub use clustering::{grid_cluster, Cluster, ClusteringConfig};
pub use index::{SpatialIndex, SpatialItem};
