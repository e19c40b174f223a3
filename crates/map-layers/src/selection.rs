//! The single selected feature, owned above the map surface.

use baysense_common::FeatureId;
use serde::Serialize;
use tracing::debug;

use crate::layer::VectorKind;

/// Identifies a feature across overlays; ids are only unique per overlay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SelectionKey {
    pub overlay: VectorKind,
    pub id: FeatureId,
}

impl SelectionKey {
    pub fn new(overlay: VectorKind, id: FeatureId) -> Self {
        Self { overlay, id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    Unchanged,
    Selected(SelectionKey),
    /// Clicking the selected feature again toggles it off.
    Deselected(SelectionKey),
    /// A click on empty map cleared the previous selection.
    Cleared(SelectionKey),
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    current: Option<SelectionKey>,
}

impl Selection {
    pub fn current(&self) -> Option<&SelectionKey> {
        self.current.as_ref()
    }

    /// Selected id within one overlay.
    pub fn selected_in(&self, overlay: VectorKind) -> Option<&FeatureId> {
        self.current
            .as_ref()
            .filter(|key| key.overlay == overlay)
            .map(|key| &key.id)
    }

    /// Apply the result of a click hit-test.
    pub fn apply_click(&mut self, hit: Option<SelectionKey>) -> SelectionChange {
        let change = match (hit, self.current.take()) {
            (Some(hit), Some(current)) if hit == current => SelectionChange::Deselected(current),
            (Some(hit), _) => {
                self.current = Some(hit.clone());
                SelectionChange::Selected(hit)
            }
            (None, Some(current)) => SelectionChange::Cleared(current),
            (None, None) => SelectionChange::Unchanged,
        };
        debug!(change = ?change, "Selection updated");
        change
    }

    /// Select directly, e.g. from a search result.
    pub fn select(&mut self, key: Option<SelectionKey>) -> SelectionChange {
        if key == self.current {
            return SelectionChange::Unchanged;
        }
        let previous = std::mem::replace(&mut self.current, key.clone());
        match (key, previous) {
            (Some(key), _) => SelectionChange::Selected(key),
            (None, Some(previous)) => SelectionChange::Cleared(previous),
            (None, None) => SelectionChange::Unchanged,
        }
    }
}
