//! Accelerator config file schema.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use va_core::units::{coulomb, ev};
use va_lattice::{Segment, load_lattice};
use va_pv::ControlNameMap;
use va_sim::{BeamOptions, ParticleBeam, TwissParameters};

use crate::ConfigResult;
use crate::devices::load_relevant_controls;

/// Everything needed to bring up one virtual accelerator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AcceleratorConfig {
    /// Lattice file (JSON or YAML)
    pub lattice: PathBuf,
    pub mapping: MappingSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shutter_pv: Option<String>,
    #[serde(default = "default_poll_period_ms")]
    pub poll_period_ms: u64,
    #[serde(default)]
    pub beam: BeamDef,
}

fn default_poll_period_ms() -> u64 {
    100
}

/// Where the control-name mapping comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum MappingSource {
    /// CSV with `Control System Name` and `Element` columns
    Csv(PathBuf),
    /// Device YAML; each device maps to its lower-cased MAD name
    Devices(PathBuf),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BeamDef {
    #[serde(default = "default_energy_ev")]
    pub energy_ev: f64,
    #[serde(default = "default_total_charge")]
    pub total_charge_c: f64,
    #[serde(default = "default_num_particles")]
    pub num_particles: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_sigma_tau")]
    pub sigma_tau: f64,
    #[serde(default = "default_sigma_delta")]
    pub sigma_delta: f64,
    #[serde(default)]
    pub twiss: TwissDef,
}

fn default_energy_ev() -> f64 {
    1.0e9
}

fn default_total_charge() -> f64 {
    1.0e-9
}

fn default_num_particles() -> usize {
    10_000
}

fn default_sigma_tau() -> f64 {
    1e-6
}

fn default_sigma_delta() -> f64 {
    1e-4
}

impl Default for BeamDef {
    fn default() -> Self {
        Self {
            energy_ev: default_energy_ev(),
            total_charge_c: default_total_charge(),
            num_particles: default_num_particles(),
            seed: 0,
            sigma_tau: default_sigma_tau(),
            sigma_delta: default_sigma_delta(),
            twiss: TwissDef::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TwissDef {
    pub beta_x: f64,
    pub alpha_x: f64,
    pub emittance_x: f64,
    pub beta_y: f64,
    pub alpha_y: f64,
    pub emittance_y: f64,
}

impl Default for TwissDef {
    fn default() -> Self {
        let t = TwissParameters::default();
        Self {
            beta_x: t.beta_x,
            alpha_x: t.alpha_x,
            emittance_x: t.emittance_x,
            beta_y: t.beta_y,
            alpha_y: t.alpha_y,
            emittance_y: t.emittance_y,
        }
    }
}

impl BeamDef {
    pub fn twiss(&self) -> TwissParameters {
        TwissParameters {
            beta_x: self.twiss.beta_x,
            alpha_x: self.twiss.alpha_x,
            emittance_x: self.twiss.emittance_x,
            beta_y: self.twiss.beta_y,
            alpha_y: self.twiss.alpha_y,
            emittance_y: self.twiss.emittance_y,
        }
    }

    pub fn options(&self) -> BeamOptions {
        BeamOptions {
            energy: ev(self.energy_ev),
            total_charge: coulomb(self.total_charge_c),
            num_particles: self.num_particles,
            sigma_tau: self.sigma_tau,
            sigma_delta: self.sigma_delta,
            seed: self.seed,
        }
    }

    pub fn build(&self) -> ConfigResult<ParticleBeam> {
        Ok(ParticleBeam::from_twiss(&self.twiss(), &self.options())?)
    }
}

impl AcceleratorConfig {
    /// Make relative file paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.lattice);
        match &mut self.mapping {
            MappingSource::Csv(p) | MappingSource::Devices(p) => resolve(p),
        }
    }

    pub fn load_lattice(&self) -> ConfigResult<Segment> {
        Ok(load_lattice(&self.lattice)?)
    }

    pub fn load_mapping(&self) -> ConfigResult<ControlNameMap> {
        match &self.mapping {
            MappingSource::Csv(path) => Ok(ControlNameMap::load_csv(path)?),
            MappingSource::Devices(path) => Ok(load_relevant_controls(path)?.control_name_map()),
        }
    }
}
