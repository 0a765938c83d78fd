//! Rectangle multi-select over visible markers.
//!
//! During a drag the highlight is applied live, relative to the selection
//! that existed when the gesture started. Select commits the ids inside the
//! rectangle; clear reverts the markers to the stored selection.

use super::handle::VisualClass;
use super::registry::MarkerRegistry;
use crate::prelude::HashSet;

#[derive(Debug, Clone, Default)]
pub struct LassoSelection {
    active: bool,
    highlighted: HashSet<String>,
    pre_selected: HashSet<String>,
    pre_checked: HashSet<String>,
}

impl LassoSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn highlighted(&self) -> &HashSet<String> {
        &self.highlighted
    }

    fn ensure_started(&mut self, selected: &HashSet<String>, collected: &HashSet<String>) {
        if self.active {
            return;
        }
        self.pre_selected = selected.clone();
        self.pre_checked = collected.clone();
        self.active = true;
    }

    /// Live feedback for the ids currently inside the rectangle
    pub fn highlight(
        &mut self,
        in_bounds: Vec<String>,
        deselect: bool,
        registry: &mut MarkerRegistry,
        selected: &HashSet<String>,
        collected: &HashSet<String>,
    ) {
        self.ensure_started(selected, collected);
        let next: HashSet<String> = in_bounds.into_iter().collect();

        let entering: Vec<&String> = next.iter().filter(|id| !self.highlighted.contains(*id)).collect();
        let leaving: Vec<&String> = self.highlighted.iter().filter(|id| !next.contains(*id)).collect();

        if deselect {
            for id in entering {
                if let Some(handle) = registry.handle_mut(id) {
                    handle.set_class(VisualClass::Selected, false);
                    handle.set_class(VisualClass::Checked, false);
                }
            }
            for id in leaving {
                if let Some(handle) = registry.handle_mut(id) {
                    handle.set_class(VisualClass::Selected, self.pre_selected.contains(id));
                    handle.set_class(VisualClass::Checked, self.pre_checked.contains(id));
                }
            }
        } else {
            for id in entering {
                if self.pre_selected.contains(id) || self.pre_checked.contains(id) {
                    continue;
                }
                if let Some(handle) = registry.handle_mut(id) {
                    handle.set_class(VisualClass::Selected, true);
                }
            }
            for id in leaving {
                if self.pre_selected.contains(id) {
                    continue;
                }
                if let Some(handle) = registry.handle_mut(id) {
                    handle.set_class(VisualClass::Selected, false);
                }
            }
        }

        self.highlighted = next;
    }

    /// Ends the gesture, returning the ids inside the final rectangle
    pub fn select(&mut self, in_bounds: Vec<String>) -> Vec<String> {
        self.reset();
        in_bounds
    }

    /// Aborts the gesture, restoring the stored selection on highlighted markers
    pub fn clear(&mut self, registry: &mut MarkerRegistry, selected: &HashSet<String>) {
        for id in &self.highlighted {
            if let Some(handle) = registry.handle_mut(id) {
                handle.set_class(VisualClass::Selected, selected.contains(id));
            }
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.active = false;
        self.highlighted.clear();
        self.pre_selected.clear();
        self.pre_checked.clear();
    }
}
