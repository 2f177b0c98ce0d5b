//! Particle beam state.

use nalgebra::Vector6;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use va_core::units::{Charge, Energy, as_coulomb, as_ev, ev};
use va_core::{ensure_finite, ensure_positive};

use crate::error::{SimError, SimResult};

/// Phase-space coordinates of one macro-particle:
/// `(x [m], px [rad], y [m], py [rad], tau [m], delta [1])`.
pub type Particle = Vector6<f64>;

/// Twiss parameters of the incoming beam in both transverse planes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwissParameters {
    pub beta_x: f64,
    pub alpha_x: f64,
    /// Geometric emittance (m·rad)
    pub emittance_x: f64,
    pub beta_y: f64,
    pub alpha_y: f64,
    pub emittance_y: f64,
}

impl Default for TwissParameters {
    fn default() -> Self {
        Self {
            beta_x: 10.0,
            alpha_x: 0.0,
            emittance_x: 5e-8,
            beta_y: 10.0,
            alpha_y: 0.0,
            emittance_y: 5e-8,
        }
    }
}

/// Everything besides the Twiss parameters needed to generate a beam.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamOptions {
    pub energy: Energy,
    pub total_charge: Charge,
    pub num_particles: usize,
    /// RMS bunch length (m)
    pub sigma_tau: f64,
    /// RMS relative energy spread
    pub sigma_delta: f64,
    pub seed: u64,
}

impl Default for BeamOptions {
    fn default() -> Self {
        Self {
            energy: ev(1.0e9),
            total_charge: va_core::units::coulomb(1e-9),
            num_particles: 10_000,
            sigma_tau: 1e-6,
            sigma_delta: 1e-4,
            seed: 0,
        }
    }
}

/// Incoming or tracked particle ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleBeam {
    /// Reference energy (eV)
    energy: f64,
    particles: Vec<Particle>,
    /// Charge carried by each particle (C)
    charges: Vec<f64>,
}

impl ParticleBeam {
    /// Create a beam. `charges` must have one entry per particle.
    pub fn new(energy: Energy, particles: Vec<Particle>, charges: Vec<f64>) -> SimResult<Self> {
        let energy = ensure_positive(as_ev(energy), "beam energy")?;
        if particles.len() != charges.len() {
            return Err(SimError::InvalidArg {
                what: "one charge per particle required",
            });
        }
        for q in &charges {
            ensure_finite(*q, "particle charge")?;
        }
        Ok(Self {
            energy,
            particles,
            charges,
        })
    }

    /// A single on-axis particle carrying no charge. Used to probe the
    /// energy profile of a segment without disturbing anything.
    pub fn probe(energy: Energy) -> SimResult<Self> {
        Self::new(energy, vec![Particle::zeros()], vec![0.0])
    }

    /// Generate a Gaussian beam matched to `twiss`. The same options always
    /// give the same particles.
    pub fn from_twiss(twiss: &TwissParameters, opts: &BeamOptions) -> SimResult<Self> {
        if opts.num_particles == 0 {
            return Err(SimError::InvalidArg {
                what: "num_particles must be positive",
            });
        }
        let beta_x = ensure_positive(twiss.beta_x, "beta_x")?;
        let beta_y = ensure_positive(twiss.beta_y, "beta_y")?;
        let eps_x = ensure_positive(twiss.emittance_x, "emittance_x")?;
        let eps_y = ensure_positive(twiss.emittance_y, "emittance_y")?;
        let alpha_x = ensure_finite(twiss.alpha_x, "alpha_x")?;
        let alpha_y = ensure_finite(twiss.alpha_y, "alpha_y")?;
        let total_charge = ensure_finite(as_coulomb(opts.total_charge), "total_charge")?;

        let normal = Normal::new(0.0, 1.0).map_err(|_| SimError::InvalidArg {
            what: "standard normal distribution",
        })?;
        let mut rng = StdRng::seed_from_u64(opts.seed);
        let mut particles = Vec::with_capacity(opts.num_particles);
        for _ in 0..opts.num_particles {
            let [u1, u2, u3, u4, u5, u6]: [f64; 6] =
                std::array::from_fn(|_| normal.sample(&mut rng));

            let x = (eps_x * beta_x).sqrt() * u1;
            let px = -alpha_x / beta_x * x + (eps_x / beta_x).sqrt() * u2;
            let y = (eps_y * beta_y).sqrt() * u3;
            let py = -alpha_y / beta_y * y + (eps_y / beta_y).sqrt() * u4;

            particles.push(Particle::new(
                x,
                px,
                y,
                py,
                opts.sigma_tau * u5,
                opts.sigma_delta * u6,
            ));
        }

        let per_particle = total_charge / opts.num_particles as f64;
        Self::new(
            opts.energy,
            particles,
            vec![per_particle; opts.num_particles],
        )
    }

    pub fn energy(&self) -> Energy {
        ev(self.energy)
    }

    /// Reference energy in eV.
    pub fn energy_ev(&self) -> f64 {
        self.energy
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn charges(&self) -> &[f64] {
        &self.charges
    }

    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    pub fn total_charge(&self) -> f64 {
        self.charges.iter().sum()
    }

    /// Replace per-particle charges, keeping coordinates and energy.
    pub fn set_charges(&mut self, charges: Vec<f64>) -> SimResult<()> {
        if charges.len() != self.particles.len() {
            return Err(SimError::InvalidArg {
                what: "one charge per particle required",
            });
        }
        for q in &charges {
            ensure_finite(*q, "particle charge")?;
        }
        self.charges = charges;
        Ok(())
    }

    /// Zero every particle charge. Coordinates and energy are untouched.
    pub fn zero_charge(&mut self) {
        self.charges.iter_mut().for_each(|q| *q = 0.0);
    }

    /// Charge-weighted centroid `[x, y]`, or zeros when the beam carries no charge.
    pub fn centroid(&self) -> [f64; 2] {
        let total: f64 = self.charges.iter().map(|q| q.abs()).sum();
        if total <= 0.0 {
            return [0.0; 2];
        }
        let (sx, sy) = self
            .particles
            .iter()
            .zip(&self.charges)
            .fold((0.0, 0.0), |(sx, sy), (p, q)| {
                (sx + p[0] * q.abs(), sy + p[2] * q.abs())
            });
        [sx / total, sy / total]
    }

    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub(crate) fn set_energy_ev(&mut self, energy: f64) {
        self.energy = energy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use va_core::units::coulomb;

    #[test]
    fn probe_carries_no_charge() {
        let probe = ParticleBeam::probe(ev(1e8)).unwrap();
        assert_eq!(probe.num_particles(), 1);
        assert_eq!(probe.total_charge(), 0.0);
        assert_eq!(probe.centroid(), [0.0, 0.0]);
    }

    #[test]
    fn twiss_beam_is_reproducible() {
        let opts = BeamOptions {
            num_particles: 500,
            seed: 7,
            ..Default::default()
        };
        let a = ParticleBeam::from_twiss(&TwissParameters::default(), &opts).unwrap();
        let b = ParticleBeam::from_twiss(&TwissParameters::default(), &opts).unwrap();
        assert_eq!(a, b);
        assert!((a.total_charge() - 1e-9).abs() < 1e-18);
    }

    #[test]
    fn twiss_beam_size_matches_beta_and_emittance() {
        let twiss = TwissParameters {
            beta_x: 4.0,
            emittance_x: 1e-6,
            ..Default::default()
        };
        let opts = BeamOptions {
            num_particles: 20_000,
            seed: 3,
            ..Default::default()
        };
        let beam = ParticleBeam::from_twiss(&twiss, &opts).unwrap();
        let n = beam.num_particles() as f64;
        let var: f64 = beam.particles().iter().map(|p| p[0] * p[0]).sum::<f64>() / n;
        let expected = twiss.beta_x * twiss.emittance_x;
        assert!((var - expected).abs() / expected < 0.05);
    }

    #[test]
    fn longitudinal_spread_matches_options() {
        let opts = BeamOptions {
            num_particles: 20_000,
            sigma_tau: 2e-6,
            sigma_delta: 5e-4,
            seed: 9,
            ..Default::default()
        };
        let beam = ParticleBeam::from_twiss(&TwissParameters::default(), &opts).unwrap();
        let n = beam.num_particles() as f64;
        let rms = |i: usize| {
            (beam.particles().iter().map(|p| p[i] * p[i]).sum::<f64>() / n).sqrt()
        };
        assert!((rms(4) - opts.sigma_tau).abs() / opts.sigma_tau < 0.05);
        assert!((rms(5) - opts.sigma_delta).abs() / opts.sigma_delta < 0.05);
        let mean_y = beam.particles().iter().map(|p| p[2]).sum::<f64>() / n;
        assert!(mean_y.abs() < 0.05 * rms(2));
    }

    #[test]
    fn zero_charge_keeps_coordinates() {
        let opts = BeamOptions {
            num_particles: 10,
            total_charge: coulomb(2e-9),
            ..Default::default()
        };
        let mut beam = ParticleBeam::from_twiss(&TwissParameters::default(), &opts).unwrap();
        let before = beam.particles().to_vec();
        beam.zero_charge();
        assert_eq!(beam.total_charge(), 0.0);
        assert_eq!(beam.particles(), before.as_slice());
    }

    #[test]
    fn mismatched_charges_rejected() {
        let err = ParticleBeam::new(ev(1e9), vec![Particle::zeros()], vec![]);
        assert!(err.is_err());
        assert!(ParticleBeam::new(ev(-1.0), vec![], vec![]).is_err());
    }
}
