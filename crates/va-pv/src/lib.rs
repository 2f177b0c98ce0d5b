//! Process-variable layer of the virtual accelerator.
//!
//! This crate turns control-system names and values into element accesses:
//!
//! - [`PvValue`]: the value carried by a PV read or write
//! - [`PvName`]: structured `DEVICE:AREA:UNIT:ATTRIBUTE` parsing
//! - [`conversion`]: magnetic rigidity and field-integral conversions
//! - [`registry`]: per element type table of attribute accessors
//! - [`ControlNameMap`]: control-system base name to element names
//!
//! The registry is static and immutable; it can be shared by any number of
//! engines. Nothing in this crate runs the simulation.

pub mod conversion;
pub mod error;
pub mod mapping;
pub mod name;
pub mod registry;
pub mod value;

pub use error::{PvError, PvResult};
pub use mapping::ControlNameMap;
pub use name::PvName;
pub use registry::{Access, Accessor, NativeWrite};
pub use value::PvValue;
