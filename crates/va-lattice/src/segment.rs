//! Ordered beamline segment.

use std::collections::HashMap;

use va_core::ElementIdx;

use crate::element::Element;

/// The beamline: an ordered, validated collection of elements.
///
/// Order is physically meaningful and is preserved exactly as built.
/// The segment stores:
/// - All elements in a vector (indexed by `ElementIdx`)
/// - A name index. A name may map to several positions when a physical
///   device is modelled as paired elements (e.g. split quadrupole halves).
#[derive(Debug, Clone)]
pub struct Segment {
    pub(crate) name: String,
    pub(crate) elements: Vec<Element>,
    pub(crate) by_name: HashMap<String, Vec<ElementIdx>>,
}

impl Segment {
    pub(crate) fn from_parts(name: String, elements: Vec<Element>) -> Self {
        let mut by_name: HashMap<String, Vec<ElementIdx>> = HashMap::new();
        for (i, element) in elements.iter().enumerate() {
            by_name
                .entry(element.name.clone())
                .or_default()
                .push(ElementIdx::from_index(i as u32));
        }
        Self {
            name,
            elements,
            by_name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return all elements in beamline order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Get an element by index (returns None if index out of bounds).
    pub fn element(&self, idx: ElementIdx) -> Option<&Element> {
        self.elements.get(idx.slot())
    }

    /// Mutable access for the owning engine and the tracker.
    pub fn element_mut(&mut self, idx: ElementIdx) -> Option<&mut Element> {
        self.elements.get_mut(idx.slot())
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.elements.iter_mut()
    }

    /// All positions carrying `name` (case-insensitive), in beamline order.
    /// Empty if the name is unknown.
    pub fn find(&self, name: &str) -> &[ElementIdx] {
        let key = name.to_lowercase();
        self.by_name.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        !self.find(name).is_empty()
    }

    /// Sum of element lengths (m).
    pub fn total_length(&self) -> f64 {
        self.elements.iter().map(Element::length).sum()
    }
}
