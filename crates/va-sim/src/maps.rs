//! Linear transfer maps.
//!
//! Coordinates follow [`Particle`](crate::Particle):
//! `(x, px, y, py, tau, delta)`. All matrices are first order and ignore
//! chromatic terms.

use nalgebra::Matrix6;
use va_core::constants::ELECTRON_MASS_EV;

/// Strengths below this are treated as zero (pure drift).
const STRENGTH_EPS: f64 = 1e-12;

/// Relativistic `(gamma, beta)` for an electron of total energy `energy_ev`.
pub fn lorentz_factors(energy_ev: f64) -> (f64, f64) {
    let gamma = energy_ev / ELECTRON_MASS_EV;
    let beta = (1.0 - 1.0 / (gamma * gamma)).max(0.0).sqrt();
    (gamma, beta)
}

pub fn drift(length: f64, energy_ev: f64) -> Matrix6<f64> {
    let (gamma, beta) = lorentz_factors(energy_ev);
    let mut r = Matrix6::identity();
    r[(0, 1)] = length;
    r[(2, 3)] = length;
    if gamma > 1.0 {
        r[(4, 5)] = length / (beta * beta * gamma * gamma);
    }
    r
}

/// 2x2 block for one transverse plane of a thick quadrupole.
fn quad_plane(length: f64, k1: f64) -> [[f64; 2]; 2] {
    let k = k1.abs().sqrt();
    let phi = k * length;
    if k1 > 0.0 {
        [[phi.cos(), phi.sin() / k], [-k * phi.sin(), phi.cos()]]
    } else {
        [[phi.cosh(), phi.sinh() / k], [k * phi.sinh(), phi.cosh()]]
    }
}

/// Thick quadrupole. Positive `k1` focuses horizontally.
pub fn quadrupole(length: f64, k1: f64, energy_ev: f64) -> Matrix6<f64> {
    if k1.abs() < STRENGTH_EPS {
        return drift(length, energy_ev);
    }
    let mut r = drift(length, energy_ev);
    let mx = quad_plane(length, k1);
    let my = quad_plane(length, -k1);
    for i in 0..2 {
        for j in 0..2 {
            r[(i, j)] = mx[i][j];
            r[(2 + i, 2 + j)] = my[i][j];
        }
    }
    r
}

/// Thick solenoid with strength `k = Bs / (2 Bρ)`; couples the planes.
pub fn solenoid(length: f64, k: f64, energy_ev: f64) -> Matrix6<f64> {
    if k.abs() < STRENGTH_EPS {
        return drift(length, energy_ev);
    }
    let c = (k * length).cos();
    let s = (k * length).sin();
    let mut r = drift(length, energy_ev);
    let block = [
        [c * c, s * c / k, s * c, s * s / k],
        [-k * s * c, c * c, -k * s * s, s * c],
        [-s * c, -s * s / k, c * c, s * c / k],
        [k * s * s, -s * c, -k * s * c, c * c],
    ];
    for (i, row) in block.iter().enumerate() {
        for (j, v) in row.iter().enumerate() {
            r[(i, j)] = *v;
        }
    }
    r
}
