//! Layer order (paint order) and per-layer visibility.

use crate::element::ElementId;
use crate::error::{EditorError, EditorResult};
use std::collections::HashMap;

/// Rendering z-index of the bottom-most layer.
pub const Z_INDEX_BASE: usize = 10;

/// Bottom-to-top sequence of element ids plus a visibility flag per id.
///
/// Kept a permutation of the live element set by [`crate::Editor`]; every
/// element add or remove goes through [`LayerOrder::push_top`] and
/// [`LayerOrder::remove`] in the same operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerOrder {
    order: Vec<ElementId>,
    visibility: HashMap<ElementId, bool>,
}

impl LayerOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new id on top of the stack, visible.
    pub fn push_top(&mut self, id: ElementId) {
        if self.visibility.contains_key(&id) {
            return;
        }
        self.visibility.insert(id.clone(), true);
        self.order.push(id);
    }

    /// Remove an id from both the order and the visibility map.
    pub fn remove(&mut self, id: &ElementId) -> bool {
        let Some(pos) = self.index_of(id) else {
            return false;
        };
        self.order.remove(pos);
        self.visibility.remove(id);
        true
    }

    /// Move the layer at `from` so it ends up at index `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> EditorResult<()> {
        let len = self.order.len();
        if from >= len {
            return Err(EditorError::LayerIndexOutOfRange { index: from, len });
        }
        if to >= len {
            return Err(EditorError::LayerIndexOutOfRange { index: to, len });
        }
        let id = self.order.remove(from);
        self.order.insert(to, id);
        Ok(())
    }

    /// Move one step toward the top. Returns false if already on top.
    pub fn move_up(&mut self, id: &ElementId) -> bool {
        match self.index_of(id) {
            Some(pos) if pos + 1 < self.order.len() => {
                self.order.swap(pos, pos + 1);
                true
            }
            _ => false,
        }
    }

    /// Move one step toward the bottom. Returns false if already at the bottom.
    pub fn move_down(&mut self, id: &ElementId) -> bool {
        match self.index_of(id) {
            Some(pos) if pos > 0 => {
                self.order.swap(pos, pos - 1);
                true
            }
            _ => false,
        }
    }

    pub fn to_front(&mut self, id: &ElementId) -> bool {
        let Some(pos) = self.index_of(id) else {
            return false;
        };
        let last = self.order.len() - 1;
        if pos == last {
            return false;
        }
        let id = self.order.remove(pos);
        self.order.push(id);
        true
    }

    pub fn to_back(&mut self, id: &ElementId) -> bool {
        match self.index_of(id) {
            Some(pos) if pos > 0 => {
                let id = self.order.remove(pos);
                self.order.insert(0, id);
                true
            }
            _ => false,
        }
    }

    /// Flip visibility. Returns the new state, or `None` for unknown ids.
    pub fn toggle_visibility(&mut self, id: &ElementId) -> Option<bool> {
        let visible = self.visibility.get_mut(id)?;
        *visible = !*visible;
        Some(*visible)
    }

    pub fn set_visible(&mut self, id: &ElementId, visible: bool) -> bool {
        match self.visibility.get_mut(id) {
            Some(v) => {
                *v = visible;
                true
            }
            None => false,
        }
    }

    /// Unknown ids report as hidden.
    pub fn is_visible(&self, id: &ElementId) -> bool {
        self.visibility.get(id).copied().unwrap_or(false)
    }

    pub fn index_of(&self, id: &ElementId) -> Option<usize> {
        self.order.iter().position(|existing| existing == id)
    }

    /// Rendering z-index: position in the stack plus [`Z_INDEX_BASE`].
    pub fn z_index(&self, id: &ElementId) -> Option<usize> {
        self.index_of(id).map(|idx| idx + Z_INDEX_BASE)
    }

    /// Ids bottom-to-top.
    pub fn ids(&self) -> &[ElementId] {
        &self.order
    }

    /// Visible ids bottom-to-top.
    pub fn visible_ids(&self) -> impl Iterator<Item = &ElementId> {
        self.order.iter().filter(|id| self.is_visible(id))
    }

    pub fn visibility(&self) -> &HashMap<ElementId, bool> {
        &self.visibility
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.visibility.clear();
    }

    /// Rebuild from a restored order, then append any live id the restored
    /// order missed. Ids not in `live` and duplicates are dropped.
    ///
    /// Returns the ids that were dropped.
    pub fn restore(
        &mut self,
        order: impl IntoIterator<Item = (ElementId, bool)>,
        live: &[ElementId],
    ) -> Vec<ElementId> {
        self.clear();
        let mut dropped = Vec::new();
        for (id, visible) in order {
            if !live.contains(&id) || self.visibility.contains_key(&id) {
                dropped.push(id);
                continue;
            }
            self.visibility.insert(id.clone(), visible);
            self.order.push(id);
        }
        for id in live {
            self.push_top(id.clone());
        }
        dropped
    }

    /// Whether the order is exactly a permutation of `ids`, with one
    /// visibility entry each.
    pub fn is_permutation_of(&self, ids: &[ElementId]) -> bool {
        self.order.len() == ids.len()
            && self.visibility.len() == ids.len()
            && ids.iter().all(|id| self.visibility.contains_key(id))
            && ids.iter().all(|id| self.order.contains(id))
    }
}
