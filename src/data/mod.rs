//! Static data: marker bundles, subregion outlines, label/link overlays and
//! the locale lookup used to name them.

pub mod label;
pub mod link;
pub mod locale;
pub mod marker;
pub mod region;

pub use label::{Label, LabelData, LabelKind};
pub use link::{GlobalLinkConfig, LinkData, LinkTarget, MapLink};
pub use locale::{JsonLocale, LocaleLookup};
pub use marker::{CollectionProgress, MarkerCategory, MarkerDataset, MarkerRecord, MarkerType, MarkerTypeCatalog};
pub use region::{AreaShape, SubregionArea, SubregionCatalog};
