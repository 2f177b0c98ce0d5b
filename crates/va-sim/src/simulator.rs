//! Simulator trait for pluggable tracking backends.

use va_core::units::Energy;
use va_lattice::Segment;

use crate::beam::ParticleBeam;
use crate::error::SimResult;

/// A deterministic, idempotent tracking step.
///
/// A Simulator must implement:
/// - `track`: push a beam through the segment in order, writing the reading
///   of every detector element, and return the outgoing beam
/// - `energy_profile`: the reference energy at the entrance of every element
///
/// Tracking the same beam through the same settings twice must produce the
/// same readings.
pub trait Simulator: Send + Sync {
    fn track(&self, segment: &mut Segment, incoming: &ParticleBeam) -> SimResult<ParticleBeam>;

    /// Energy at the entrance of each element, in segment order.
    ///
    /// Must not modify the segment; implementations usually track a
    /// zero-charge probe (see [`ParticleBeam::probe`]).
    fn energy_profile(&self, segment: &Segment, energy: Energy) -> SimResult<Vec<Energy>>;
}
