//! Incremental segment builder.

use va_core::ElementIdx;

use crate::element::{Element, ElementKind};
use crate::error::LatticeResult;
use crate::segment::Segment;
use crate::validate;

/// Builder for constructing a segment incrementally.
///
/// Use `add` to append elements in beamline order, then call `build()` to
/// validate and freeze the ordering into a `Segment`.
#[derive(Debug, Default)]
pub struct SegmentBuilder {
    name: String,
    elements: Vec<Element>,
}

impl SegmentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: Vec::new(),
        }
    }

    /// Append an element and return its position.
    pub fn add(&mut self, name: impl Into<String>, kind: ElementKind) -> ElementIdx {
        self.push(Element::new(name, kind))
    }

    /// Append an already constructed element.
    pub fn push(&mut self, element: Element) -> ElementIdx {
        let idx = ElementIdx::from_index(self.elements.len() as u32);
        self.elements.push(element);
        idx
    }

    /// Validate and build the segment.
    pub fn build(self) -> LatticeResult<Segment> {
        validate::validate_elements(&self.elements)?;
        Ok(Segment::from_parts(self.name, self.elements))
    }
}
