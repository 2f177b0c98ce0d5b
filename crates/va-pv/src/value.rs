//! PV value type.

use core::fmt;

use serde::{Deserialize, Serialize};
use va_core::ensure_finite;

use crate::error::{PvError, PvResult};

/// Value read from or written to a PV.
///
/// Serialized untagged, so JSON `true`, `3`, `0.5` and `[1.0, 2.0]` map
/// directly onto the variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PvValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Array(Vec<f64>),
}

impl PvValue {
    /// Coerce to a finite scalar. Single-element arrays are accepted.
    pub fn as_real(&self) -> PvResult<f64> {
        let v = match self {
            Self::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Int(i) => *i as f64,
            Self::Float(f) => *f,
            Self::Array(values) => match values.as_slice() {
                [v] => *v,
                _ => {
                    return Err(PvError::conversion(format!(
                        "expected a scalar, got an array of {} values",
                        values.len()
                    )));
                }
            },
        };
        Ok(ensure_finite(v, "PV value")?)
    }

    /// Coerce to a flag. Numbers are true when non-zero.
    pub fn as_bool(&self) -> PvResult<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => other.as_real().map(|v| v != 0.0),
        }
    }

    /// Scalar view for readings; `None` for arrays.
    pub fn as_scalar_opt(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Array(_) => None,
        }
    }
}

impl From<f64> for PvValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for PvValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for PvValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<Vec<f64>> for PvValue {
    fn from(v: Vec<f64>) -> Self {
        Self::Array(v)
    }
}

impl fmt::Display for PvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Array(values) => write!(f, "[{} values]", values.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_coercions() {
        assert_eq!(PvValue::Bool(true).as_real().unwrap(), 1.0);
        assert_eq!(PvValue::Int(-3).as_real().unwrap(), -3.0);
        assert_eq!(PvValue::Array(vec![0.25]).as_real().unwrap(), 0.25);
        assert!(PvValue::Array(vec![1.0, 2.0]).as_real().is_err());
        assert!(PvValue::Float(f64::NAN).as_real().is_err());
    }

    #[test]
    fn bool_coercions() {
        assert!(PvValue::Int(1).as_bool().unwrap());
        assert!(!PvValue::Float(0.0).as_bool().unwrap());
        assert!(PvValue::Array(vec![]).as_bool().is_err());
    }

    #[test]
    fn untagged_json() {
        let values: Vec<PvValue> = serde_json::from_str("[true, 3, 0.5, [1.0, 2.0]]").unwrap();
        assert_eq!(
            values,
            vec![
                PvValue::Bool(true),
                PvValue::Int(3),
                PvValue::Float(0.5),
                PvValue::Array(vec![1.0, 2.0]),
            ]
        );
    }
}
