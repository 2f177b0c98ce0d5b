//! Element parameter validation.

use crate::element::{Element, ElementKind};
use crate::error::{LatticeError, LatticeResult};

fn finite(element: &Element, field: &'static str, value: f64) -> LatticeResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LatticeError::InvalidParameter {
            name: element.name.clone(),
            field,
            value,
            reason: "must be finite",
        })
    }
}

fn non_negative(element: &Element, field: &'static str, value: f64) -> LatticeResult<()> {
    finite(element, field, value)?;
    if value < 0.0 {
        return Err(LatticeError::InvalidParameter {
            name: element.name.clone(),
            field,
            value,
            reason: "must be non-negative",
        });
    }
    Ok(())
}

fn positive(element: &Element, field: &'static str, value: f64) -> LatticeResult<()> {
    finite(element, field, value)?;
    if value <= 0.0 {
        return Err(LatticeError::InvalidParameter {
            name: element.name.clone(),
            field,
            value,
            reason: "must be positive",
        });
    }
    Ok(())
}

pub(crate) fn validate_elements(elements: &[Element]) -> LatticeResult<()> {
    for (position, element) in elements.iter().enumerate() {
        if element.name.trim().is_empty() {
            return Err(LatticeError::EmptyName { position });
        }
        validate_element(element)?;
    }
    Ok(())
}

fn validate_element(e: &Element) -> LatticeResult<()> {
    match &e.kind {
        ElementKind::Drift { length } | ElementKind::Unsupported { length, .. } => {
            non_negative(e, "length", *length)
        }
        ElementKind::Quadrupole { length, k1 } => {
            non_negative(e, "length", *length)?;
            finite(e, "k1", *k1)
        }
        ElementKind::Solenoid { length, k } => {
            non_negative(e, "length", *length)?;
            finite(e, "k", *k)
        }
        ElementKind::HorizontalCorrector { length, angle }
        | ElementKind::VerticalCorrector { length, angle } => {
            non_negative(e, "length", *length)?;
            finite(e, "angle", *angle)
        }
        ElementKind::Bpm { .. } => Ok(()),
        ElementKind::Screen {
            resolution,
            pixel_size,
            ..
        } => {
            for n in resolution {
                if *n == 0 {
                    return Err(LatticeError::InvalidParameter {
                        name: e.name.clone(),
                        field: "resolution",
                        value: 0.0,
                        reason: "must be at least one pixel",
                    });
                }
            }
            positive(e, "pixel_size", pixel_size[0])?;
            positive(e, "pixel_size", pixel_size[1])
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
            non_negative(e, "length", *length)?;
            finite(e, "voltage", *voltage)?;
            finite(e, "phase", *phase)?;
            positive(e, "frequency", *frequency)
        }
    }
}
