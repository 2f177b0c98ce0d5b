//! Attribute accessor registry.
//!
//! Maps `(element type, PV attribute)` to a getter and an optional setter.
//! Tables are static; [`resolve`] is an exhaustive match over
//! [`ElementType`], so a new element kind must be given a table (possibly
//! empty) before it compiles.

use core::fmt;

use va_core::units::Energy;
use va_lattice::{Element, ElementKind, ElementType, Param};

use crate::conversion;
use crate::error::{PvError, PvResult};
use crate::value::PvValue;

/// Direction of a PV access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

type Getter = fn(&Element, Energy) -> PvResult<PvValue>;
type Setter = fn(&Element, Energy, &PvValue) -> PvResult<NativeWrite>;

/// A converted setpoint, ready to be stored on an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeWrite {
    pub param: Param,
    pub value: f64,
}

impl NativeWrite {
    fn new(param: Param, value: f64) -> Self {
        Self { param, value }
    }

    /// Store the value. Fails if `element` has no such parameter.
    pub fn apply(self, element: &mut Element) -> PvResult<()> {
        if element.set_param(self.param, self.value) {
            Ok(())
        } else {
            Err(missing_param(element, self.param))
        }
    }
}

/// A getter and optional setter for one attribute of one element type.
#[derive(Clone, Copy)]
pub struct Accessor {
    pub attribute: &'static str,
    getter: Getter,
    setter: Option<Setter>,
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("attribute", &self.attribute)
            .field("writable", &self.is_writable())
            .finish()
    }
}

impl Accessor {
    const fn read_only(attribute: &'static str, getter: Getter) -> Self {
        Self {
            attribute,
            getter,
            setter: None,
        }
    }

    const fn read_write(attribute: &'static str, getter: Getter, setter: Setter) -> Self {
        Self {
            attribute,
            getter,
            setter: Some(setter),
        }
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Read the attribute using the beam energy at the element.
    pub fn get(&self, element: &Element, energy: Energy) -> PvResult<PvValue> {
        (self.getter)(element, energy)
    }

    /// Convert `value` to the native setpoint for `element` without
    /// touching it.
    pub fn convert(&self, element: &Element, energy: Energy, value: &PvValue) -> PvResult<NativeWrite> {
        let write = match self.setter {
            Some(setter) => setter(element, energy, value)?,
            None => {
                return Err(unsupported(
                    element.element_type(),
                    self.attribute,
                    Access::Write,
                ));
            }
        };
        if element.param(write.param).is_none() {
            return Err(missing_param(element, write.param));
        }
        Ok(write)
    }

    /// Write the attribute using the beam energy at the element.
    pub fn set(&self, element: &mut Element, energy: Energy, value: &PvValue) -> PvResult<()> {
        self.convert(element, energy, value)?.apply(element)
    }
}

fn unsupported(element_type: ElementType, attribute: &str, access: Access) -> PvError {
    PvError::UnsupportedAttribute {
        element_type,
        attribute: attribute.to_string(),
        access,
    }
}

fn missing_param(element: &Element, param: Param) -> PvError {
    PvError::conversion(format!(
        "element '{}' of type {} has no {param:?}",
        element.name,
        element.element_type()
    ))
}

fn native(element: &Element, param: Param) -> PvResult<f64> {
    element
        .param(param)
        .ok_or_else(|| missing_param(element, param))
}

fn reading_component(element: &Element, index: usize) -> PvResult<PvValue> {
    element
        .reading()
        .and_then(|r| r.get(index))
        .map(|v| PvValue::Float(*v))
        .ok_or_else(|| PvError::conversion(format!("'{}' has no reading", element.name)))
}

// Quadrupole

fn quad_field(e: &Element, energy: Energy) -> PvResult<PvValue> {
    let k1 = native(e, Param::K1)?;
    Ok(conversion::field_integral_from_k1(k1, e.length(), energy).into())
}

fn set_quad_field(e: &Element, energy: Energy, v: &PvValue) -> PvResult<NativeWrite> {
    let k1 = conversion::k1_from_field_integral(v.as_real()?, e.length(), energy)?;
    Ok(NativeWrite::new(Param::K1, k1))
}

static QUADRUPOLE: &[Accessor] = &[
    Accessor::read_write("BCTRL", quad_field, set_quad_field),
    Accessor::read_only("BACT", quad_field),
];

// Solenoid

fn solenoid_field(e: &Element, energy: Energy) -> PvResult<PvValue> {
    let k = native(e, Param::K)?;
    Ok(conversion::solenoid_field_from_k(k, energy).into())
}

fn set_solenoid_field(_: &Element, energy: Energy, v: &PvValue) -> PvResult<NativeWrite> {
    let k = conversion::k_from_solenoid_field(v.as_real()?, energy)?;
    Ok(NativeWrite::new(Param::K, k))
}

static SOLENOID: &[Accessor] = &[
    Accessor::read_write("BCTRL", solenoid_field, set_solenoid_field),
    Accessor::read_only("BACT", solenoid_field),
];

// Correctors

fn corrector_field(e: &Element, energy: Energy) -> PvResult<PvValue> {
    let angle = native(e, Param::Angle)?;
    Ok(conversion::kick_from_angle(angle, energy).into())
}

fn set_corrector_field(_: &Element, energy: Energy, v: &PvValue) -> PvResult<NativeWrite> {
    let angle = conversion::angle_from_kick(v.as_real()?, energy)?;
    Ok(NativeWrite::new(Param::Angle, angle))
}

static CORRECTOR: &[Accessor] = &[
    Accessor::read_write("BCTRL", corrector_field, set_corrector_field),
    Accessor::read_only("BACT", corrector_field),
];

// Transverse deflecting cavity

fn tcav_voltage(e: &Element, _: Energy) -> PvResult<PvValue> {
    Ok(native(e, Param::Voltage)?.into())
}

fn set_tcav_voltage(_: &Element, _: Energy, v: &PvValue) -> PvResult<NativeWrite> {
    Ok(NativeWrite::new(Param::Voltage, v.as_real()?))
}

fn tcav_phase(e: &Element, _: Energy) -> PvResult<PvValue> {
    Ok(native(e, Param::Phase)?.into())
}

fn set_tcav_phase(_: &Element, _: Energy, v: &PvValue) -> PvResult<NativeWrite> {
    Ok(NativeWrite::new(Param::Phase, v.as_real()?))
}

static TCAV: &[Accessor] = &[
    Accessor::read_write("AREQ", tcav_voltage, set_tcav_voltage),
    Accessor::read_write("PREQ", tcav_phase, set_tcav_phase),
    Accessor::read_only("AACT", tcav_voltage),
    Accessor::read_only("PACT", tcav_phase),
];

// BPM

fn bpm_x(e: &Element, _: Energy) -> PvResult<PvValue> {
    reading_component(e, 0)
}

fn bpm_y(e: &Element, _: Energy) -> PvResult<PvValue> {
    reading_component(e, 1)
}

static BPM: &[Accessor] = &[
    Accessor::read_only("XSCDT1H", bpm_x),
    Accessor::read_only("YSCDT1H", bpm_y),
];

// Screen

fn screen_image(e: &Element, _: Energy) -> PvResult<PvValue> {
    match &e.kind {
        ElementKind::Screen {
            resolution,
            reading,
            ..
        } => Ok(PvValue::Array(
            reading
                .clone()
                .unwrap_or_else(|| vec![0.0; resolution[0] * resolution[1]]),
        )),
        _ => Err(unsupported(e.element_type(), "Image:ArrayData", Access::Read)),
    }
}

fn screen_inserted(e: &Element, _: Energy) -> PvResult<PvValue> {
    Ok(PvValue::Bool(native(e, Param::IsActive)? != 0.0))
}

fn set_screen_inserted(_: &Element, _: Energy, v: &PvValue) -> PvResult<NativeWrite> {
    let inserted = if v.as_bool()? { 1.0 } else { 0.0 };
    Ok(NativeWrite::new(Param::IsActive, inserted))
}

fn screen_geometry(e: &Element) -> Option<([usize; 2], [f64; 2])> {
    match &e.kind {
        ElementKind::Screen {
            resolution,
            pixel_size,
            ..
        } => Some((*resolution, *pixel_size)),
        _ => None,
    }
}

fn screen_columns(e: &Element, _: Energy) -> PvResult<PvValue> {
    screen_geometry(e)
        .map(|(res, _)| PvValue::Int(res[0] as i64))
        .ok_or_else(|| unsupported(e.element_type(), "Image:ArraySize1_RBV", Access::Read))
}

fn screen_rows(e: &Element, _: Energy) -> PvResult<PvValue> {
    screen_geometry(e)
        .map(|(res, _)| PvValue::Int(res[1] as i64))
        .ok_or_else(|| unsupported(e.element_type(), "Image:ArraySize2_RBV", Access::Read))
}

fn screen_pixel_size(e: &Element, _: Energy) -> PvResult<PvValue> {
    screen_geometry(e)
        .map(|(_, px)| PvValue::Float(px[0]))
        .ok_or_else(|| unsupported(e.element_type(), "RESOLUTION", Access::Read))
}

static SCREEN: &[Accessor] = &[
    Accessor::read_only("Image:ArrayData", screen_image),
    Accessor::read_write("PNEUMATIC", screen_inserted, set_screen_inserted),
    Accessor::read_only("Image:ArraySize1_RBV", screen_columns),
    Accessor::read_only("Image:ArraySize2_RBV", screen_rows),
    Accessor::read_only("RESOLUTION", screen_pixel_size),
];

/// All accessors defined for an element type. Empty for types that are not
/// addressable (drifts, accelerating cavities, unsupported elements).
pub fn entries(element_type: ElementType) -> &'static [Accessor] {
    match element_type {
        ElementType::Quadrupole => QUADRUPOLE,
        ElementType::Solenoid => SOLENOID,
        ElementType::HorizontalCorrector | ElementType::VerticalCorrector => CORRECTOR,
        ElementType::TransverseDeflectingCavity => TCAV,
        ElementType::Bpm => BPM,
        ElementType::Screen => SCREEN,
        ElementType::Drift | ElementType::Cavity | ElementType::Unsupported => &[],
    }
}

/// Find the accessor for `attribute` on `element_type`.
///
/// Fails with [`PvError::UnsupportedAttribute`] if the type has no such
/// attribute, or if `access` is a write and the attribute is read-only.
pub fn resolve(
    element_type: ElementType,
    attribute: &str,
    access: Access,
) -> PvResult<&'static Accessor> {
    entries(element_type)
        .iter()
        .find(|a| a.attribute == attribute)
        .filter(|a| access == Access::Read || a.is_writable())
        .ok_or_else(|| unsupported(element_type, attribute, access))
}
