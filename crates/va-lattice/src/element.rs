//! Beamline elements.
//!
//! Element kinds form a closed set. Anything a lattice file names that is not
//! modelled here loads as [`ElementKind::Unsupported`]: it is tracked as a
//! drift and is never addressable through the control namespace.

use core::fmt;

use va_core::constants::DEFAULT_RF_FREQUENCY_HZ;

/// Field-less discriminant of [`ElementKind`], used as a registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementType {
    Drift,
    Quadrupole,
    Solenoid,
    HorizontalCorrector,
    VerticalCorrector,
    Bpm,
    Screen,
    TransverseDeflectingCavity,
    Cavity,
    Unsupported,
}

impl ElementType {
    /// Canonical type name, as written in lattice files and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Drift => "Drift",
            Self::Quadrupole => "Quadrupole",
            Self::Solenoid => "Solenoid",
            Self::HorizontalCorrector => "HorizontalCorrector",
            Self::VerticalCorrector => "VerticalCorrector",
            Self::Bpm => "BPM",
            Self::Screen => "Screen",
            Self::TransverseDeflectingCavity => "TransverseDeflectingCavity",
            Self::Cavity => "Cavity",
            Self::Unsupported => "Unsupported",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Simulation-native scalar parameters that can be read or written by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    /// Quadrupole focusing strength (1/m^2)
    K1,
    /// Solenoid strength (1/m)
    K,
    /// Corrector deflection angle (rad)
    Angle,
    /// RF voltage (V)
    Voltage,
    /// RF phase (deg)
    Phase,
    /// Screen/BPM insertion state, as 0.0 or 1.0
    IsActive,
}

/// Type-specific parameters and last tracking reading of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Drift {
        length: f64,
    },
    Quadrupole {
        length: f64,
        k1: f64,
    },
    Solenoid {
        length: f64,
        k: f64,
    },
    HorizontalCorrector {
        length: f64,
        angle: f64,
    },
    VerticalCorrector {
        length: f64,
        angle: f64,
    },
    Bpm {
        is_active: bool,
        /// Charge-weighted centroid [x, y] (m) from the last tracking pass.
        reading: [f64; 2],
    },
    Screen {
        /// [columns, rows] in pixels
        resolution: [usize; 2],
        /// [width, height] of one pixel (m)
        pixel_size: [f64; 2],
        is_active: bool,
        /// Row-major image from the last tracking pass.
        reading: Option<Vec<f64>>,
    },
    TransverseDeflectingCavity {
        length: f64,
        voltage: f64,
        phase: f64,
        frequency: f64,
    },
    Cavity {
        length: f64,
        voltage: f64,
        phase: f64,
        frequency: f64,
    },
    Unsupported {
        type_name: String,
        length: f64,
    },
}

impl ElementKind {
    pub fn drift(length: f64) -> Self {
        Self::Drift { length }
    }

    pub fn quadrupole(length: f64, k1: f64) -> Self {
        Self::Quadrupole { length, k1 }
    }

    pub fn solenoid(length: f64, k: f64) -> Self {
        Self::Solenoid { length, k }
    }

    pub fn horizontal_corrector(length: f64, angle: f64) -> Self {
        Self::HorizontalCorrector { length, angle }
    }

    pub fn vertical_corrector(length: f64, angle: f64) -> Self {
        Self::VerticalCorrector { length, angle }
    }

    pub fn bpm() -> Self {
        Self::Bpm {
            is_active: true,
            reading: [0.0; 2],
        }
    }

    pub fn screen(resolution: [usize; 2], pixel_size: [f64; 2]) -> Self {
        Self::Screen {
            resolution,
            pixel_size,
            is_active: true,
            reading: None,
        }
    }

    pub fn tcav(length: f64, voltage: f64, phase: f64) -> Self {
        Self::TransverseDeflectingCavity {
            length,
            voltage,
            phase,
            frequency: DEFAULT_RF_FREQUENCY_HZ,
        }
    }

    pub fn cavity(length: f64, voltage: f64, phase: f64) -> Self {
        Self::Cavity {
            length,
            voltage,
            phase,
            frequency: DEFAULT_RF_FREQUENCY_HZ,
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Drift { .. } => ElementType::Drift,
            Self::Quadrupole { .. } => ElementType::Quadrupole,
            Self::Solenoid { .. } => ElementType::Solenoid,
            Self::HorizontalCorrector { .. } => ElementType::HorizontalCorrector,
            Self::VerticalCorrector { .. } => ElementType::VerticalCorrector,
            Self::Bpm { .. } => ElementType::Bpm,
            Self::Screen { .. } => ElementType::Screen,
            Self::TransverseDeflectingCavity { .. } => ElementType::TransverseDeflectingCavity,
            Self::Cavity { .. } => ElementType::Cavity,
            Self::Unsupported { .. } => ElementType::Unsupported,
        }
    }
}

/// A named node of the beamline.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub kind: ElementKind,
}

impl Element {
    /// Create an element. The name is lower-cased so that control mappings
    /// can address it regardless of the case used in the source files.
    pub fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            name: name.into().to_lowercase(),
            kind,
        }
    }

    pub fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    /// Physical length (m). Zero for BPMs and screens.
    pub fn length(&self) -> f64 {
        match &self.kind {
            ElementKind::Drift { length }
            | ElementKind::Quadrupole { length, .. }
            | ElementKind::Solenoid { length, .. }
            | ElementKind::HorizontalCorrector { length, .. }
            | ElementKind::VerticalCorrector { length, .. }
            | ElementKind::TransverseDeflectingCavity { length, .. }
            | ElementKind::Cavity { length, .. }
            | ElementKind::Unsupported { length, .. } => *length,
            ElementKind::Bpm { .. } | ElementKind::Screen { .. } => 0.0,
        }
    }

    /// Read a native parameter. `None` if this kind has no such parameter.
    pub fn param(&self, param: Param) -> Option<f64> {
        match (&self.kind, param) {
            (ElementKind::Quadrupole { k1, .. }, Param::K1) => Some(*k1),
            (ElementKind::Solenoid { k, .. }, Param::K) => Some(*k),
            (ElementKind::HorizontalCorrector { angle, .. }, Param::Angle)
            | (ElementKind::VerticalCorrector { angle, .. }, Param::Angle) => Some(*angle),
            (ElementKind::TransverseDeflectingCavity { voltage, .. }, Param::Voltage)
            | (ElementKind::Cavity { voltage, .. }, Param::Voltage) => Some(*voltage),
            (ElementKind::TransverseDeflectingCavity { phase, .. }, Param::Phase)
            | (ElementKind::Cavity { phase, .. }, Param::Phase) => Some(*phase),
            (ElementKind::Bpm { is_active, .. }, Param::IsActive)
            | (ElementKind::Screen { is_active, .. }, Param::IsActive) => {
                Some(if *is_active { 1.0 } else { 0.0 })
            }
            _ => None,
        }
    }

    /// Write a native parameter. Returns `false` (and leaves the element
    /// untouched) if this kind has no such parameter.
    pub fn set_param(&mut self, param: Param, value: f64) -> bool {
        match (&mut self.kind, param) {
            (ElementKind::Quadrupole { k1, .. }, Param::K1) => *k1 = value,
            (ElementKind::Solenoid { k, .. }, Param::K) => *k = value,
            (ElementKind::HorizontalCorrector { angle, .. }, Param::Angle)
            | (ElementKind::VerticalCorrector { angle, .. }, Param::Angle) => *angle = value,
            (ElementKind::TransverseDeflectingCavity { voltage, .. }, Param::Voltage)
            | (ElementKind::Cavity { voltage, .. }, Param::Voltage) => *voltage = value,
            (ElementKind::TransverseDeflectingCavity { phase, .. }, Param::Phase)
            | (ElementKind::Cavity { phase, .. }, Param::Phase) => *phase = value,
            (ElementKind::Bpm { is_active, .. }, Param::IsActive)
            | (ElementKind::Screen { is_active, .. }, Param::IsActive) => {
                *is_active = value != 0.0
            }
            _ => return false,
        }
        true
    }

    /// True for elements that produce a reading when tracked.
    pub fn is_detector(&self) -> bool {
        matches!(
            self.kind,
            ElementKind::Bpm { .. } | ElementKind::Screen { .. }
        )
    }

    /// Last reading as a flat slice (BPM centroid or screen image).
    pub fn reading(&self) -> Option<&[f64]> {
        match &self.kind {
            ElementKind::Bpm { reading, .. } => Some(reading.as_slice()),
            ElementKind::Screen { reading, .. } => reading.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_lowercased() {
        let e = Element::new("QM01", ElementKind::quadrupole(0.1, 1.0));
        assert_eq!(e.name, "qm01");
        assert_eq!(e.element_type(), ElementType::Quadrupole);
    }

    #[test]
    fn param_access_matches_kind() {
        let mut q = Element::new("q", ElementKind::quadrupole(0.2, 1.5));
        assert_eq!(q.param(Param::K1), Some(1.5));
        assert_eq!(q.param(Param::Angle), None);
        assert!(q.set_param(Param::K1, -3.0));
        assert_eq!(q.param(Param::K1), Some(-3.0));
        assert!(!q.set_param(Param::Voltage, 1.0));
        assert!((q.length() - 0.2).abs() < 1e-15);
    }

    #[test]
    fn is_active_round_trips_as_flag() {
        let mut s = Element::new("otr", ElementKind::screen([4, 3], [1e-3, 1e-3]));
        assert_eq!(s.param(Param::IsActive), Some(1.0));
        s.set_param(Param::IsActive, 0.0);
        assert_eq!(s.param(Param::IsActive), Some(0.0));
        assert!(s.is_detector());
        assert!(s.reading().is_none());
        assert_eq!(s.length(), 0.0);
    }

    #[test]
    fn type_names_are_canonical() {
        assert_eq!(ElementType::Bpm.name(), "BPM");
        assert_eq!(
            ElementKind::tcav(0.1, 0.0, 0.0).element_type().to_string(),
            "TransverseDeflectingCavity"
        );
    }
}
