//! Accelerator config validation.

use crate::schema::AcceleratorConfig;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing value: {field}")]
    Missing { field: String },
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be finite and positive".to_string(),
        })
    }
}

fn finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be finite".to_string(),
        })
    }
}

pub fn validate_config(config: &AcceleratorConfig) -> Result<(), ValidationError> {
    if config.lattice.as_os_str().is_empty() {
        return Err(ValidationError::Missing {
            field: "lattice".to_string(),
        });
    }
    if let Some(pv) = &config.shutter_pv {
        if pv.trim().is_empty() {
            return Err(ValidationError::Missing {
                field: "shutter_pv".to_string(),
            });
        }
    }
    if config.poll_period_ms == 0 {
        return Err(ValidationError::InvalidValue {
            field: "poll_period_ms".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        });
    }

    let beam = &config.beam;
    positive("beam.energy_ev", beam.energy_ev)?;
    finite("beam.total_charge_c", beam.total_charge_c)?;
    if beam.total_charge_c < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "beam.total_charge_c".to_string(),
            value: beam.total_charge_c.to_string(),
            reason: "must be non-negative".to_string(),
        });
    }
    if beam.num_particles == 0 {
        return Err(ValidationError::InvalidValue {
            field: "beam.num_particles".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    finite("beam.sigma_tau", beam.sigma_tau)?;
    finite("beam.sigma_delta", beam.sigma_delta)?;

    let twiss = &beam.twiss;
    positive("beam.twiss.beta_x", twiss.beta_x)?;
    positive("beam.twiss.beta_y", twiss.beta_y)?;
    positive("beam.twiss.emittance_x", twiss.emittance_x)?;
    positive("beam.twiss.emittance_y", twiss.emittance_y)?;
    finite("beam.twiss.alpha_x", twiss.alpha_x)?;
    finite("beam.twiss.alpha_y", twiss.alpha_y)?;
    Ok(())
}
