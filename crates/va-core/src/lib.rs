//! va-core: stable foundation for the virtual accelerator.
//!
//! Contains:
//! - units (uom SI types, electronvolt constructors, beam physics constants)
//! - numeric (Real + tolerances + float helpers)
//! - ids (compact element indices)
//! - error (shared error types)
//! - timing (opt-in simulate/probe timers)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod timing;
pub mod units;

pub use error::{VaError, VaResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
