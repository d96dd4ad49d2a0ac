//! Element store: the authoritative id-keyed map of placed elements.

use crate::element::{Element, ElementId, ElementType};
use std::collections::HashMap;

/// Owns every live element, keyed by id, plus the counters used to mint
/// ids and display names.
#[derive(Debug, Clone, Default)]
pub struct ElementStore {
    elements: HashMap<ElementId, Element>,
    /// Insertion order, used for serialization and creation-order fallbacks.
    order: Vec<ElementId>,
    /// Last minted id counter. Never reset, so ids are never reused.
    last_id: u64,
    name_counters: HashMap<ElementType, u32>,
}

impl ElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next element id.
    pub fn mint_id(&mut self) -> ElementId {
        self.last_id += 1;
        ElementId::from_counter(self.last_id)
    }

    /// Make sure future ids are minted above `id`'s counter.
    pub fn reserve_id(&mut self, id: &ElementId) {
        if let Some(n) = id.counter() {
            self.last_id = self.last_id.max(n);
        }
    }

    /// Next display name for a type, e.g. "Circle 3".
    pub fn next_name(&mut self, element_type: ElementType) -> String {
        let counter = self.name_counters.entry(element_type).or_insert(0);
        *counter += 1;
        format!("{} {}", element_type.label(), counter)
    }

    pub fn reset_name_counters(&mut self) {
        self.name_counters.clear();
    }

    /// Insert an element. Replaces any element with the same id in place.
    pub fn insert(&mut self, element: Element) {
        let id = element.id().clone();
        if self.elements.insert(id.clone(), element).is_none() {
            self.order.push(id);
        }
    }

    pub fn remove(&mut self, id: &ElementId) -> Option<Element> {
        let removed = self.elements.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(removed)
    }

    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn get_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> &[ElementId] {
        &self.order
    }

    /// Elements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.order.iter().filter_map(|id| self.elements.get(id))
    }

    /// Remove all elements and reset name counters. The id counter keeps going.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.order.clear();
        self.reset_name_counters();
    }
}
