//! va-lattice: beamline model for the virtual accelerator.
//!
//! Provides:
//! - Element kinds as a closed set of variants (quadrupole, corrector, screen, ...)
//! - Ordered `Segment` with a name index that tolerates paired elements
//! - Incremental segment builder with validation
//! - Lattice file schema (JSON or YAML) and loader
//!
//! # Example
//!
//! ```
//! use va_lattice::{ElementKind, SegmentBuilder};
//!
//! let mut builder = SegmentBuilder::new("demo");
//! builder.add("d1", ElementKind::drift(1.0));
//! builder.add("q1", ElementKind::quadrupole(0.1, 2.0));
//! let segment = builder.build().unwrap();
//!
//! assert_eq!(segment.len(), 2);
//! assert_eq!(segment.find("Q1").len(), 1);
//! ```

pub mod builder;
pub mod element;
pub mod error;
pub mod file;
pub mod schema;
pub mod segment;
pub(crate) mod validate;

pub use builder::SegmentBuilder;
pub use element::{Element, ElementKind, ElementType, Param};
pub use error::{LatticeError, LatticeResult};
pub use file::{load_json, load_lattice, load_yaml, save_json};
pub use schema::{ElementDef, LatticeDef};
pub use segment::Segment;
