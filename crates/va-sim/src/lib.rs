//! Beam tracking for the virtual accelerator.
//!
//! Provides:
//! - `ParticleBeam`: energy, 6-D particle coordinates, per-particle charges
//! - Reproducible beam generation from Twiss parameters
//! - The `Simulator` trait: a deterministic, idempotent tracking step
//! - `LinearTracker`: linear transfer maps with screen and BPM readings
//!
//! The engine treats the simulator as a black box. Anything implementing
//! `Simulator` can stand in for `LinearTracker`.

pub mod beam;
pub mod error;
pub mod maps;
pub mod simulator;
pub mod tracker;

pub use beam::{BeamOptions, Particle, ParticleBeam, TwissParameters};
pub use error::{SimError, SimResult};
pub use simulator::Simulator;
pub use tracker::LinearTracker;
