//! Error types for the engine.

use va_pv::{Access, PvError};

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced to the transport layer.
///
/// PV errors carry the full PV name; the wrapped [`PvError`] names the
/// element type and attribute.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Failed to {access} PV '{pv}': {source}")]
    Pv {
        pv: String,
        access: Access,
        #[source]
        source: PvError,
    },

    #[error("Control name '{control}' maps to '{elements}', which is not in the segment")]
    MissingElement { control: String, elements: String },

    #[error("Simulation failure: {0}")]
    Simulation(#[from] va_sim::SimError),

    #[error("Lattice error: {0}")]
    Lattice(#[from] va_lattice::LatticeError),

    #[error("Mapping error: {0}")]
    Mapping(#[from] PvError),

    #[error("Configuration error: {0}")]
    Config(#[from] va_config::ConfigError),

    #[error("Accelerator state lock poisoned")]
    Poisoned,
}

impl EngineError {
    pub(crate) fn pv(pv: &str, access: Access) -> impl FnOnce(PvError) -> Self + '_ {
        move |source| Self::Pv {
            pv: pv.to_string(),
            access,
            source,
        }
    }

    /// The underlying PV error, if this is one.
    pub fn pv_error(&self) -> Option<&PvError> {
        match self {
            Self::Pv { source, .. } | Self::Mapping(source) => Some(source),
            _ => None,
        }
    }
}
