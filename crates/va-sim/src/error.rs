//! Error types for tracking operations.

use thiserror::Error;

/// Errors encountered while building a beam or tracking it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical condition at '{element}': {what}")]
    NonPhysical { element: String, what: &'static str },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<va_core::VaError> for SimError {
    fn from(e: va_core::VaError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}
