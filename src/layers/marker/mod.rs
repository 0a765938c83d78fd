//! Marker registry, visibility and clustering.

pub mod cluster;
pub mod handle;
pub mod lasso;
pub mod layer;
pub mod registry;

pub use cluster::{ClusterDiff, ClusterIcon, ClusterLayer};
pub use handle::{Container, IconDescriptor, MarkerHandle, MarkerVariant, VisualClass};
pub use lasso::LassoSelection;
pub use layer::MarkerLayer;
pub use registry::{MarkerRegistry, VisualGroup};
