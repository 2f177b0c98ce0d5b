// va-core/src/units.rs

use uom::si::f64::{
    ElectricCharge as UomElectricCharge, Energy as UomEnergy, Length as UomLength,
};

// Public canonical unit types (SI, f64)
pub type Charge = UomElectricCharge;
pub type Energy = UomEnergy;
pub type Length = UomLength;

#[inline]
pub fn ev(v: f64) -> Energy {
    use uom::si::energy::electronvolt;
    Energy::new::<electronvolt>(v)
}

#[inline]
pub fn gev(v: f64) -> Energy {
    ev(v * 1.0e9)
}

/// Read an energy back as electronvolts.
#[inline]
pub fn as_ev(e: Energy) -> f64 {
    use uom::si::energy::electronvolt;
    e.get::<electronvolt>()
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn coulomb(v: f64) -> Charge {
    use uom::si::electric_charge::coulomb;
    Charge::new::<coulomb>(v)
}

#[inline]
pub fn as_coulomb(q: Charge) -> f64 {
    use uom::si::electric_charge::coulomb;
    q.get::<coulomb>()
}

pub mod constants {
    /// Magnetic rigidity per GeV of beam energy, in kG·m.
    pub const RIGIDITY_KG_M_PER_GEV: f64 = 33.356;

    pub const SPEED_OF_LIGHT_MPS: f64 = 299_792_458.0;

    /// Electron rest energy (eV).
    pub const ELECTRON_MASS_EV: f64 = 510_998.95;

    /// S-band TCAV frequency used when a lattice omits one (Hz).
    pub const DEFAULT_RF_FREQUENCY_HZ: f64 = 2.856e9;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _e = ev(1.0e9);
        let _l = m(2.0);
        let _q = coulomb(1e-9);
    }

    #[test]
    fn electronvolt_round_trip() {
        let e = gev(1.0);
        let back = as_ev(e);
        assert!((back - 1.0e9).abs() < 1e-3);
        assert!((as_coulomb(coulomb(1e-9)) - 1e-9).abs() < 1e-24);
    }
}
