use crate::layers::base::{LayerId, LayerTrait};
use crate::prelude::HashMap;

/// Tracks which layers are attached to the viewport and their stacking order.
///
/// Layer objects are owned by their components (tile layers by `MapCore`,
/// marker groups by `MarkerLayer`, overlays by their hooks); the manager only
/// records attachment, mirroring a map's "has layer" bookkeeping.
#[derive(Debug, Default)]
pub struct LayerManager {
    z_indices: HashMap<LayerId, i32>,
    /// Attached layer ids sorted by z-index, ties in attach order
    render_order: Vec<LayerId>,
}

impl LayerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a layer in its pane; returns false if it was already attached
    pub fn attach(&mut self, id: LayerId) -> bool {
        let z_index = id.pane().z_index();
        self.attach_with_z_index(id, z_index)
    }

    /// Attaches a layer object using its own z-index
    pub fn attach_layer(&mut self, layer: &dyn LayerTrait) -> bool {
        self.attach_with_z_index(layer.id().clone(), layer.z_index())
    }

    fn attach_with_z_index(&mut self, id: LayerId, z_index: i32) -> bool {
        if self.z_indices.contains_key(&id) {
            return false;
        }
        self.z_indices.insert(id.clone(), z_index);

        // Insert in sorted order by z-index
        let insert_pos = self
            .render_order
            .iter()
            .position(|other| {
                self.z_indices
                    .get(other)
                    .map(|z| *z > z_index)
                    .unwrap_or(false)
            })
            .unwrap_or(self.render_order.len());
        self.render_order.insert(insert_pos, id);
        true
    }

    /// Detaches a layer; returns false if it was not attached
    pub fn detach(&mut self, id: &LayerId) -> bool {
        if self.z_indices.remove(id).is_none() {
            return false;
        }
        self.render_order.retain(|other| other != id);
        true
    }

    pub fn is_attached(&self, id: &LayerId) -> bool {
        self.z_indices.contains_key(id)
    }

    /// Detaches every layer, returning what was attached
    pub fn clear(&mut self) -> Vec<LayerId> {
        self.z_indices.clear();
        std::mem::take(&mut self.render_order)
    }

    /// Attached layers, bottom to top
    pub fn layers(&self) -> &[LayerId] {
        &self.render_order
    }

    pub fn len(&self) -> usize {
        self.render_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.render_order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_order_follows_panes() {
        let mut layers = LayerManager::new();
        layers.attach(LayerId::Labels);
        layers.attach(LayerId::SubregionGroup("a".into()));
        layers.attach(LayerId::BaseTiles);
        layers.attach(LayerId::Links);

        assert_eq!(
            layers.layers(),
            &[
                LayerId::BaseTiles,
                LayerId::SubregionGroup("a".into()),
                LayerId::Links,
                LayerId::Labels,
            ]
        );
    }

    #[test]
    fn test_attach_is_idempotent() {
        let mut layers = LayerManager::new();
        assert!(layers.attach(LayerId::BaseTiles));
        assert!(!layers.attach(LayerId::BaseTiles));
        assert_eq!(layers.len(), 1);

        assert!(layers.detach(&LayerId::BaseTiles));
        assert!(!layers.detach(&LayerId::BaseTiles));
    }

    #[test]
    fn test_clear_returns_everything() {
        let mut layers = LayerManager::new();
        layers.attach(LayerId::BaseTiles);
        layers.attach(LayerId::Boundary("x".into()));
        let removed = layers.clear();
        assert_eq!(removed.len(), 2);
        assert!(layers.is_empty());
    }
}
