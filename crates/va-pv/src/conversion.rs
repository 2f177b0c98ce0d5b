//! Unit conversions between control-system and simulation quantities.
//!
//! Every function takes the beam energy at the element, not a global energy.
//! Field integrals are in kG·m, lengths in m, angles in rad.

use va_core::constants::RIGIDITY_KG_M_PER_GEV;
use va_core::units::{Energy, as_ev};

use crate::error::{PvError, PvResult};

/// Magnetic rigidity Bρ (kG·m) of a beam with the given total energy.
pub fn magnetic_rigidity(energy: Energy) -> f64 {
    RIGIDITY_KG_M_PER_GEV * as_ev(energy) / 1e9
}

fn nonzero_rigidity(energy: Energy) -> PvResult<f64> {
    let brho = magnetic_rigidity(energy);
    if !brho.is_finite() || brho == 0.0 {
        return Err(PvError::conversion(format!(
            "magnetic rigidity is {brho} kG·m at this element"
        )));
    }
    Ok(brho)
}

/// Quadrupole integrated gradient from `k1`.
pub fn field_integral_from_k1(k1: f64, length: f64, energy: Energy) -> f64 {
    k1 * length * magnetic_rigidity(energy)
}

/// `k1` from a quadrupole integrated gradient.
pub fn k1_from_field_integral(bl: f64, length: f64, energy: Energy) -> PvResult<f64> {
    if length == 0.0 {
        return Err(PvError::conversion("quadrupole with zero length"));
    }
    Ok(bl / nonzero_rigidity(energy)? / length)
}

/// Solenoid field from its strength `k = Bs / (2 Bρ)`.
pub fn solenoid_field_from_k(k: f64, energy: Energy) -> f64 {
    2.0 * k * magnetic_rigidity(energy)
}

pub fn k_from_solenoid_field(field: f64, energy: Energy) -> PvResult<f64> {
    Ok(field / (2.0 * nonzero_rigidity(energy)?))
}

/// Corrector field integral from its deflection angle.
pub fn kick_from_angle(angle: f64, energy: Energy) -> f64 {
    angle * magnetic_rigidity(energy)
}

pub fn angle_from_kick(bl: f64, energy: Energy) -> PvResult<f64> {
    Ok(bl / nonzero_rigidity(energy)?)
}
