//! Everything that can be attached to the viewport: tiles, marker groups,
//! labels, link hotspots and subregion outlines.

#[macro_use]
pub mod macros;

pub mod base;
pub mod boundary;
pub mod label;
pub mod link;
pub mod manager;
pub mod marker;
pub mod tile;

pub use base::{LayerId, LayerProperties, LayerTrait, LayerType, Pane};
pub use manager::LayerManager;
