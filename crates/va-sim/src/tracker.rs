//! Linear tracking backend.

use rayon::prelude::*;
use tracing::debug;
use va_core::timing::{Timer, sim_timing};
use va_core::units::{Energy, ev};
use va_lattice::{Element, ElementKind, Segment};

use crate::beam::{Particle, ParticleBeam};
use crate::error::{SimError, SimResult};
use crate::maps;
use crate::simulator::Simulator;

/// Tracks particles element by element with first-order transfer maps.
///
/// Correctors and the transverse deflecting cavity are thin kicks at the
/// element centre; accelerating cavities change the reference energy and
/// damp transverse slopes by the momentum ratio.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearTracker;

impl LinearTracker {
    pub fn new() -> Self {
        Self
    }

    /// Propagate `beam` through one element. Readings are not touched.
    fn propagate(&self, element: &Element, beam: &mut ParticleBeam) -> SimResult<()> {
        let energy = beam.energy_ev();
        match &element.kind {
            ElementKind::Drift { length } | ElementKind::Unsupported { length, .. } => {
                apply_matrix(beam, &maps::drift(*length, energy));
            }
            ElementKind::Quadrupole { length, k1 } => {
                apply_matrix(beam, &maps::quadrupole(*length, *k1, energy));
            }
            ElementKind::Solenoid { length, k } => {
                apply_matrix(beam, &maps::solenoid(*length, *k, energy));
            }
            ElementKind::HorizontalCorrector { length, angle } => {
                let half = maps::drift(length / 2.0, energy);
                apply_matrix(beam, &half);
                kick(beam, |p| p[1] += angle);
                apply_matrix(beam, &half);
            }
            ElementKind::VerticalCorrector { length, angle } => {
                let half = maps::drift(length / 2.0, energy);
                apply_matrix(beam, &half);
                kick(beam, |p| p[3] += angle);
                apply_matrix(beam, &half);
            }
            ElementKind::TransverseDeflectingCavity {
                length,
                voltage,
                phase,
                frequency,
            } => {
                let half = maps::drift(length / 2.0, energy);
                let phi = phase.to_radians();
                let k_rf = 2.0 * std::f64::consts::PI * frequency
                    / va_core::constants::SPEED_OF_LIGHT_MPS;
                let strength = voltage / energy;
                apply_matrix(beam, &half);
                kick(beam, |p| {
                    p[3] += strength * (phi.sin() + k_rf * p[4] * phi.cos());
                });
                apply_matrix(beam, &half);
            }
            ElementKind::Cavity {
                length,
                voltage,
                phase,
                ..
            } => {
                let gain = voltage * phase.to_radians().cos();
                let exit = energy + gain;
                if !exit.is_finite() || exit <= 0.0 {
                    return Err(SimError::NonPhysical {
                        element: element.name.clone(),
                        what: "beam energy must stay positive",
                    });
                }
                let (_, beta_in) = maps::lorentz_factors(energy);
                let (_, beta_out) = maps::lorentz_factors(exit);
                let ratio = (energy * beta_in) / (exit * beta_out);
                apply_matrix(beam, &maps::drift(length / 2.0, energy));
                kick(beam, |p| {
                    p[1] *= ratio;
                    p[3] *= ratio;
                });
                beam.set_energy_ev(exit);
                apply_matrix(beam, &maps::drift(length / 2.0, exit));
            }
            ElementKind::Bpm { .. } | ElementKind::Screen { .. } => {}
        }
        Ok(())
    }
}

fn apply_matrix(beam: &mut ParticleBeam, r: &nalgebra::Matrix6<f64>) {
    beam.particles_mut().par_iter_mut().for_each(|p| *p = r * *p);
}

fn kick<F>(beam: &mut ParticleBeam, f: F)
where
    F: Fn(&mut Particle) + Sync + Send,
{
    beam.particles_mut().par_iter_mut().for_each(f);
}

/// Charge-weighted 2-D histogram, row-major with row 0 at the top (+y).
///
/// Pixel lookup runs in parallel; accumulation is sequential so the image
/// does not depend on the thread count.
fn screen_image(beam: &ParticleBeam, resolution: [usize; 2], pixel_size: [f64; 2]) -> Vec<f64> {
    let [cols, rows] = resolution;
    let [width, height] = pixel_size;
    let bins: Vec<Option<usize>> = beam
        .particles()
        .par_iter()
        .map(|p| {
            let col = (p[0] / width + cols as f64 / 2.0).floor();
            let row = (-p[2] / height + rows as f64 / 2.0).floor();
            let inside = col >= 0.0 && row >= 0.0 && col < cols as f64 && row < rows as f64;
            inside.then(|| row as usize * cols + col as usize)
        })
        .collect();

    let mut image = vec![0.0; cols * rows];
    for (bin, q) in bins.into_iter().zip(beam.charges()) {
        if let Some(i) = bin {
            image[i] += q.abs();
        }
    }
    image
}

fn record_reading(element: &mut Element, beam: &ParticleBeam) {
    match &mut element.kind {
        ElementKind::Bpm { is_active, reading } => {
            *reading = if *is_active { beam.centroid() } else { [0.0; 2] };
        }
        ElementKind::Screen {
            resolution,
            pixel_size,
            is_active,
            reading,
        } => {
            let image = if *is_active {
                screen_image(beam, *resolution, *pixel_size)
            } else {
                vec![0.0; resolution[0] * resolution[1]]
            };
            *reading = Some(image);
        }
        _ => {}
    }
}

impl Simulator for LinearTracker {
    fn track(&self, segment: &mut Segment, incoming: &ParticleBeam) -> SimResult<ParticleBeam> {
        let timer = Timer::start();
        let mut beam = incoming.clone();
        for element in segment.elements_mut() {
            self.propagate(element, &mut beam)?;
            if element.is_detector() {
                record_reading(element, &beam);
            }
        }
        timer.stop_into(&sim_timing::TRACK_CALLS);
        debug!(
            segment = segment.name(),
            particles = beam.num_particles(),
            charge = beam.total_charge(),
            "tracked segment"
        );
        Ok(beam)
    }

    fn energy_profile(&self, segment: &Segment, energy: Energy) -> SimResult<Vec<Energy>> {
        let timer = Timer::start();
        let mut probe = ParticleBeam::probe(energy)?;
        let mut profile = Vec::with_capacity(segment.len());
        for element in segment.elements() {
            profile.push(ev(probe.energy_ev()));
            self.propagate(element, &mut probe)?;
        }
        timer.stop_into(&sim_timing::ENERGY_PROBE_CALLS);
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use va_core::units::as_ev;
    use va_lattice::SegmentBuilder;

    fn single_particle(x: f64, y: f64, charge: f64) -> ParticleBeam {
        ParticleBeam::new(
            ev(1e9),
            vec![Particle::new(x, 0.0, y, 0.0, 0.0, 0.0)],
            vec![charge],
        )
        .unwrap()
    }

    #[test]
    fn corrector_kick_shows_on_downstream_bpm() {
        let mut b = SegmentBuilder::new("s");
        b.add("xc", ElementKind::horizontal_corrector(0.0, 1e-3));
        b.add("d", ElementKind::drift(2.0));
        let bpm = b.add("bpm", ElementKind::bpm());
        let mut seg = b.build().unwrap();

        LinearTracker.track(&mut seg, &single_particle(0.0, 0.0, 1e-12)).unwrap();
        let reading = seg.element(bpm).unwrap().reading().unwrap();
        assert!((reading[0] - 2e-3).abs() < 1e-12);
        assert_eq!(reading[1], 0.0);
    }

    #[test]
    fn screen_bins_particle_into_expected_pixel() {
        let mut b = SegmentBuilder::new("s");
        let otr = b.add("otr", ElementKind::screen([4, 4], [1e-3, 1e-3]));
        let mut seg = b.build().unwrap();

        // x in column 3, y > 0 lands in row 1 (row 0 is the top)
        LinearTracker
            .track(&mut seg, &single_particle(1.5e-3, 0.5e-3, 2.0))
            .unwrap();
        let image = seg.element(otr).unwrap().reading().unwrap();
        assert_eq!(image.len(), 16);
        assert_eq!(image[4 + 3], 2.0);
        assert_eq!(image.iter().sum::<f64>(), 2.0);
    }

    #[test]
    fn zero_charge_gives_blank_detectors() {
        let mut b = SegmentBuilder::new("s");
        let otr = b.add("otr", ElementKind::screen([4, 4], [1e-3, 1e-3]));
        let bpm = b.add("bpm", ElementKind::bpm());
        let mut seg = b.build().unwrap();

        LinearTracker
            .track(&mut seg, &single_particle(1e-4, 1e-4, 0.0))
            .unwrap();
        assert!(seg.element(otr).unwrap().reading().unwrap().iter().all(|v| *v == 0.0));
        assert_eq!(seg.element(bpm).unwrap().reading().unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn energy_profile_reports_entrance_energy() {
        let mut b = SegmentBuilder::new("s");
        b.add("q0", ElementKind::quadrupole(0.1, 0.0));
        b.add("acc", ElementKind::cavity(1.0, 5.0e8, 0.0));
        b.add("q1", ElementKind::quadrupole(0.1, 0.0));
        let seg = b.build().unwrap();

        let profile = LinearTracker.energy_profile(&seg, ev(1e9)).unwrap();
        let ev_profile: Vec<f64> = profile.into_iter().map(as_ev).collect();
        assert_eq!(ev_profile.len(), 3);
        assert!((ev_profile[0] - 1e9).abs() < 1.0);
        assert!((ev_profile[1] - 1e9).abs() < 1.0);
        assert!((ev_profile[2] - 1.5e9).abs() < 1.0);
    }

    #[test]
    fn decelerating_below_zero_fails() {
        let mut b = SegmentBuilder::new("s");
        b.add("acc", ElementKind::cavity(1.0, 2.0e9, 180.0));
        let mut seg = b.build().unwrap();
        let err = LinearTracker
            .track(&mut seg, &single_particle(0.0, 0.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, SimError::NonPhysical { .. }));
    }
}
