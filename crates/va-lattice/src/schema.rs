//! Lattice file schema.
//!
//! A lattice file is an ordered list of elements, each with a `type` and
//! the native parameters of that type:
//!
//! ```yaml
//! name: diag0
//! elements:
//!   - { name: d1, type: Drift, length: 1.0 }
//!   - { name: qdg001, type: Quadrupole, length: 0.1, k1: 2.0 }
//!   - { name: otrdg02, type: Screen, resolution: [1472, 1944], pixel_size: [2.3e-5, 2.3e-5] }
//! ```
//!
//! Parameters a type does not use are ignored. Types the simulator does not
//! model are kept as `Unsupported` so the beamline order is never altered.

use serde::{Deserialize, Serialize};
use va_core::constants::DEFAULT_RF_FREQUENCY_HZ;

use crate::builder::SegmentBuilder;
use crate::element::{Element, ElementKind};
use crate::error::{LatticeError, LatticeResult};
use crate::segment::Segment;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatticeDef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub elements: Vec<ElementDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ElementDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<[usize; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_size: Option<[f64; 2]>,
}

impl ElementDef {
    fn required<T: Copy>(&self, field: &'static str, value: Option<T>) -> LatticeResult<T> {
        value.ok_or_else(|| LatticeError::MissingField {
            name: self.name.clone(),
            type_name: self.type_name.clone(),
            field,
        })
    }

    /// Convert to a runtime element. Strengths, angles and RF settings
    /// default to zero; lengths of magnets and cavities are required.
    pub fn to_element(&self) -> LatticeResult<Element> {
        let length = || self.required("length", self.length);
        let kind = match self.type_name.as_str() {
            "Drift" => ElementKind::drift(length()?),
            "Quadrupole" => ElementKind::quadrupole(length()?, self.k1.unwrap_or(0.0)),
            "Solenoid" => ElementKind::solenoid(length()?, self.k.unwrap_or(0.0)),
            "HorizontalCorrector" => {
                ElementKind::horizontal_corrector(self.length.unwrap_or(0.0), self.angle.unwrap_or(0.0))
            }
            "VerticalCorrector" => {
                ElementKind::vertical_corrector(self.length.unwrap_or(0.0), self.angle.unwrap_or(0.0))
            }
            "BPM" => ElementKind::Bpm {
                is_active: self.is_active.unwrap_or(true),
                reading: [0.0; 2],
            },
            "Screen" => ElementKind::Screen {
                resolution: self.required("resolution", self.resolution)?,
                pixel_size: self.required("pixel_size", self.pixel_size)?,
                is_active: self.is_active.unwrap_or(false),
                reading: None,
            },
            "TransverseDeflectingCavity" => ElementKind::TransverseDeflectingCavity {
                length: length()?,
                voltage: self.voltage.unwrap_or(0.0),
                phase: self.phase.unwrap_or(0.0),
                frequency: self.frequency.unwrap_or(DEFAULT_RF_FREQUENCY_HZ),
            },
            "Cavity" => ElementKind::Cavity {
                length: length()?,
                voltage: self.voltage.unwrap_or(0.0),
                phase: self.phase.unwrap_or(0.0),
                frequency: self.frequency.unwrap_or(DEFAULT_RF_FREQUENCY_HZ),
            },
            other => ElementKind::Unsupported {
                type_name: other.to_string(),
                length: self.length.unwrap_or(0.0),
            },
        };
        Ok(Element::new(self.name.clone(), kind))
    }

    pub fn from_element(element: &Element) -> Self {
        let mut def = ElementDef {
            name: element.name.clone(),
            type_name: element.element_type().name().to_string(),
            ..Default::default()
        };
        match &element.kind {
            ElementKind::Drift { length } => def.length = Some(*length),
            ElementKind::Quadrupole { length, k1 } => {
                def.length = Some(*length);
                def.k1 = Some(*k1);
            }
            ElementKind::Solenoid { length, k } => {
                def.length = Some(*length);
                def.k = Some(*k);
            }
            ElementKind::HorizontalCorrector { length, angle }
            | ElementKind::VerticalCorrector { length, angle } => {
                def.length = Some(*length);
                def.angle = Some(*angle);
            }
            ElementKind::Bpm { is_active, .. } => def.is_active = Some(*is_active),
            ElementKind::Screen {
                resolution,
                pixel_size,
                is_active,
                ..
            } => {
                def.resolution = Some(*resolution);
                def.pixel_size = Some(*pixel_size);
                def.is_active = Some(*is_active);
            }
            ElementKind::TransverseDeflectingCavity {
                length,
                voltage,
                phase,
                frequency,
            }
            | ElementKind::Cavity {
                length,
                voltage,
                phase,
                frequency,
            } => {
                def.length = Some(*length);
                def.voltage = Some(*voltage);
                def.phase = Some(*phase);
                def.frequency = Some(*frequency);
            }
            ElementKind::Unsupported { type_name, length } => {
                def.type_name = type_name.clone();
                def.length = Some(*length);
            }
        }
        def
    }
}

impl LatticeDef {
    /// Build and validate the segment described by this file.
    pub fn to_segment(&self) -> LatticeResult<Segment> {
        let mut builder = SegmentBuilder::new(self.name.clone());
        for def in &self.elements {
            builder.push(def.to_element()?);
        }
        builder.build()
    }

    pub fn from_segment(segment: &Segment) -> Self {
        Self {
            name: segment.name().to_string(),
            elements: segment
                .elements()
                .iter()
                .map(ElementDef::from_element)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElementType;

    #[test]
    fn unknown_types_are_kept_in_place() {
        let yaml = r#"
name: test
elements:
  - { name: d1, type: Drift, length: 1.0 }
  - { name: u1, type: Undulator, length: 2.5 }
  - { name: q1, type: Quadrupole, length: 0.1, k1: 3.0 }
"#;
        let def: LatticeDef = serde_yaml::from_str(yaml).unwrap();
        let seg = def.to_segment().unwrap();
        assert_eq!(seg.len(), 3);
        assert_eq!(seg.elements()[1].element_type(), ElementType::Unsupported);
        assert!((seg.total_length() - 3.6).abs() < 1e-12);
    }

    #[test]
    fn missing_quadrupole_length_is_reported() {
        let def = ElementDef {
            name: "q1".into(),
            type_name: "Quadrupole".into(),
            ..Default::default()
        };
        let err = def.to_element().unwrap_err();
        assert!(err.to_string().contains("length"));
    }

    #[test]
    fn screens_default_to_retracted() {
        let def = ElementDef {
            name: "otr".into(),
            type_name: "Screen".into(),
            resolution: Some([10, 10]),
            pixel_size: Some([1e-4, 1e-4]),
            ..Default::default()
        };
        let e = def.to_element().unwrap();
        assert_eq!(e.param(crate::Param::IsActive), Some(0.0));
    }
}
