//! Lattice construction and loading errors.

use va_core::VaError;

/// Errors raised while building, validating, or loading a segment.
#[derive(Debug, thiserror::Error)]
pub enum LatticeError {
    #[error("Element '{name}': invalid {field} = {value} ({reason})")]
    InvalidParameter {
        name: String,
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Element at position {position} has an empty name")]
    EmptyName { position: usize },

    #[error("Element '{name}' is missing required field '{field}' for type {type_name}")]
    MissingField {
        name: String,
        type_name: String,
        field: &'static str,
    },

    #[error("Unsupported lattice file extension: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type LatticeResult<T> = Result<T, LatticeError>;

impl From<LatticeError> for VaError {
    fn from(err: LatticeError) -> Self {
        match err {
            LatticeError::InvalidParameter { .. } | LatticeError::EmptyName { .. } => {
                VaError::Invariant {
                    what: "invalid lattice element",
                }
            }
            _ => VaError::InvalidArg {
                what: "lattice could not be loaded",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_element() {
        let err = LatticeError::InvalidParameter {
            name: "q1".into(),
            field: "length",
            value: -1.0,
            reason: "must be non-negative",
        };
        let msg = err.to_string();
        assert!(msg.contains("q1"));
        assert!(msg.contains("length"));
    }

    #[test]
    fn error_conversion() {
        let err = LatticeError::EmptyName { position: 3 };
        let va: VaError = err.into();
        assert!(matches!(va, VaError::Invariant { .. }));
    }
}
