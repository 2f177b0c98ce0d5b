//! Virtual accelerator engine.
//!
//! This crate owns the simulated beamline and keeps it consistent with the
//! control namespace:
//!
//! - [`VirtualAccelerator`]: batched PV reads and writes, energy profile,
//!   beam shutter, one simulation pass per write batch
//! - [`SharedAccelerator`]: serialized handle for a transport layer and its
//!   poll loop
//! - [`LegacyDriver`]: substring-routed read/write driver kept for
//!   compatibility with older servers
//!
//! # Example
//!
//! ```
//! use va_core::constants::RIGIDITY_KG_M_PER_GEV;
//! use va_core::units::ev;
//! use va_engine::VirtualAccelerator;
//! use va_lattice::{ElementKind, SegmentBuilder};
//! use va_pv::{ControlNameMap, PvValue};
//! use va_sim::ParticleBeam;
//!
//! let mut builder = SegmentBuilder::new("demo");
//! builder.add("q1", ElementKind::quadrupole(1.0, 0.0));
//! let segment = builder.build().unwrap();
//! let mapping = ControlNameMap::from_pairs([("q1", "q1")]);
//! // Bρ = 1 kG·m
//! let beam = ParticleBeam::probe(ev(1e9 / RIGIDITY_KG_M_PER_GEV)).unwrap();
//!
//! let mut va = VirtualAccelerator::new(segment, mapping, beam).unwrap();
//! va.set_pvs([("q1:BCTRL", PvValue::Float(0.5))]).unwrap();
//! let values = va.get_pvs(["q1:BACT"]).unwrap();
//! let bact = values["q1:BACT"].as_real().unwrap();
//! assert!((bact - 0.5).abs() < 1e-9);
//! ```

pub mod engine;
pub mod error;
pub mod legacy;
pub mod shared;

pub use engine::{EnergyProfile, PvValues, VirtualAccelerator};
pub use error::{EngineError, EngineResult};
pub use legacy::{LegacyDriver, Route, RoutingMode, WriteOutcome};
pub use shared::SharedAccelerator;
