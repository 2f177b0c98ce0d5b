//! Error types for PV resolution and conversion.

use thiserror::Error;
use va_lattice::ElementType;

use crate::registry::Access;

/// Result type for PV operations.
pub type PvResult<T> = Result<T, PvError>;

/// Errors raised while resolving a PV or converting its value.
#[derive(Debug, Error)]
pub enum PvError {
    /// Control name is not in the mapping table.
    #[error("Invalid control name: {name}")]
    InvalidControlName { name: String },

    /// No accessor for this type and attribute, or no setter for a write.
    #[error("Unsupported attribute '{attribute}' for element type {element_type} ({access})")]
    UnsupportedAttribute {
        element_type: ElementType,
        attribute: String,
        access: Access,
    },

    /// Malformed or out-of-range numeric input.
    #[error("Conversion error: {what}")]
    Conversion { what: String },

    /// Mapping table could not be parsed.
    #[error("Mapping table line {line}: {what}")]
    Mapping { line: usize, what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PvError {
    pub(crate) fn conversion(what: impl Into<String>) -> Self {
        Self::Conversion { what: what.into() }
    }
}

impl From<va_core::VaError> for PvError {
    fn from(e: va_core::VaError) -> Self {
        Self::conversion(e.to_string())
    }
}
