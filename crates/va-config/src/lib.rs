//! va-config: start-up configuration for the virtual accelerator.
//!
//! - accelerator config file (lattice, mapping source, shutter, beam)
//! - device YAML loader producing the control-name mapping
//! - PV database description for the transport layer

pub mod devices;
pub mod pvdb;
pub mod schema;
pub mod validate;

pub use devices::{DeviceCategory, DeviceEntry, DeviceMap, load_relevant_controls};
pub use pvdb::{PvDatabase, PvDefaults, PvSpec, PvType, create_pvdb};
pub use schema::*;
pub use validate::{ValidationError, validate_config};

use std::path::Path;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Lattice error: {0}")]
    Lattice(#[from] va_lattice::LatticeError),

    #[error("Mapping error: {0}")]
    Mapping(#[from] va_pv::PvError),

    #[error("Beam error: {0}")]
    Beam(#[from] va_sim::SimError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load an accelerator config. Relative paths inside it are resolved
/// against the directory of `path`.
pub fn load_yaml(path: &Path) -> ConfigResult<AcceleratorConfig> {
    let content = std::fs::read_to_string(path)?;
    let mut config: AcceleratorConfig = serde_yaml::from_str(&content)?;
    validate_config(&config)?;
    if let Some(dir) = path.parent() {
        config.resolve_paths(dir);
    }
    Ok(config)
}

pub fn load_json(path: &Path) -> ConfigResult<AcceleratorConfig> {
    let content = std::fs::read_to_string(path)?;
    let mut config: AcceleratorConfig = serde_json::from_str(&content)?;
    validate_config(&config)?;
    if let Some(dir) = path.parent() {
        config.resolve_paths(dir);
    }
    Ok(config)
}

pub fn save_yaml(path: &Path, config: &AcceleratorConfig) -> ConfigResult<()> {
    validate_config(config)?;
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
