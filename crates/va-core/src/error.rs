use thiserror::Error;

pub type VaResult<T> = Result<T, VaError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VaError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}
