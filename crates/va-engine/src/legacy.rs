//! Substring-routed driver for older server scripts.
//!
//! Older servers handled each read/write by matching the PV name against
//! fixed substrings and keeping every other PV in a plain parameter store.
//! [`LegacyDriver`] keeps that surface but sends simulation traffic through
//! the engine, so unit conversion and re-simulation follow the engine's
//! rules.
//!
//! Two historical behaviours are kept on purpose:
//! - [`RoutingMode::Historical`] routes on `"BCTRL"` alone. The old test was
//!   written `'QUAD' and 'BCTRL' in reason`, whose first operand is always
//!   true, so corrector and solenoid setpoints reached the simulation too.
//! - Writes to `BACT` PVs are dropped. Actual values come from the
//!   simulation only.

use std::collections::BTreeMap;

use tracing::{debug, warn};
use va_config::PvDatabase;
use va_core::{Tolerances, nearly_equal};
use va_pv::{PvName, PvValue};
use va_sim::{LinearTracker, Simulator};

use crate::error::EngineResult;
use crate::shared::SharedAccelerator;

/// How PV names are matched to destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingMode {
    /// Substring tests, including the always-true `QUAD` operand.
    #[default]
    Historical,
    /// Parse `DEVICE:AREA:UNIT:ATTRIBUTE` and match device class and
    /// attribute exactly.
    Structured,
}

/// Where a PV request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Through the engine (registry, conversion, simulation).
    Engine,
    /// Parameter store only.
    Param,
    /// Write accepted and dropped.
    Ignore,
    /// Write rejected.
    Refuse,
}

/// Result of a [`LegacyDriver::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Applied to the simulation and re-simulated.
    Simulated,
    Stored,
    Ignored,
    Refused,
}

impl RoutingMode {
    pub fn route_write(self, reason: &str) -> Route {
        match self {
            Self::Historical => {
                if reason.ends_with(":BACT") {
                    Route::Ignore
                } else if reason.contains("BCTRL") {
                    Route::Engine
                } else if reason.contains("OTRS") {
                    Route::Refuse
                } else {
                    Route::Param
                }
            }
            Self::Structured => match PvName::parse(reason) {
                Some(pv) if pv.attribute == "BACT" => Route::Ignore,
                Some(pv) if pv.device_class == "QUAD" && pv.attribute == "BCTRL" => Route::Engine,
                Some(pv) if pv.device_class == "OTRS" => Route::Refuse,
                _ => Route::Param,
            },
        }
    }

    pub fn route_read(self, reason: &str) -> Route {
        match self {
            Self::Historical => {
                if reason.contains("Image:ArrayData") || reason.contains("BCTRL") {
                    Route::Engine
                } else {
                    Route::Param
                }
            }
            Self::Structured => match PvName::parse(reason) {
                Some(pv) if pv.device_class == "OTRS" && pv.attribute == "Image:ArrayData" => {
                    Route::Engine
                }
                Some(pv) if pv.device_class == "QUAD" && pv.attribute == "BCTRL" => Route::Engine,
                _ => Route::Param,
            },
        }
    }
}

/// Scalars compare within the default tolerances, everything else exactly.
fn same_value(a: &PvValue, b: &PvValue) -> bool {
    match (a.as_scalar_opt(), b.as_scalar_opt()) {
        (Some(x), Some(y)) => nearly_equal(x, y, Tolerances::default()),
        _ => a == b,
    }
}

/// Read/write driver with a parameter store, delegating simulated PVs to
/// a [`SharedAccelerator`].
#[derive(Debug)]
pub struct LegacyDriver<S: Simulator = LinearTracker> {
    accelerator: SharedAccelerator<S>,
    mode: RoutingMode,
    params: BTreeMap<String, PvValue>,
}

impl<S: Simulator> LegacyDriver<S> {
    pub fn new(accelerator: SharedAccelerator<S>, mode: RoutingMode) -> Self {
        Self {
            accelerator,
            mode,
            params: BTreeMap::new(),
        }
    }

    /// Seed the parameter store with the initial values of a PV database.
    pub fn with_pvdb(mut self, pvdb: &PvDatabase) -> Self {
        for (name, spec) in pvdb {
            if let Some(value) = &spec.value {
                self.params.insert(name.clone(), value.clone());
            }
        }
        self
    }

    pub fn mode(&self) -> RoutingMode {
        self.mode
    }

    pub fn get_param(&self, reason: &str) -> Option<&PvValue> {
        self.params.get(reason)
    }

    pub fn set_param(&mut self, reason: &str, value: PvValue) {
        self.params.insert(reason.to_string(), value);
    }

    /// Read `reason`. Engine-routed PVs come from the current simulation
    /// state; everything else from the parameter store.
    pub fn read(&self, reason: &str) -> EngineResult<Option<PvValue>> {
        let route = self.mode.route_read(reason);
        debug!(reason, ?route, "legacy read");
        if route != Route::Engine {
            return Ok(self.params.get(reason).cloned());
        }

        let mut values = self.accelerator.get_pvs([reason])?;
        let value = values.remove(reason);
        if let (Some(stored), Some(simulated)) = (self.params.get(reason), &value) {
            if !same_value(stored, simulated) {
                debug!(reason, %stored, %simulated, "stored value differs from simulation");
            }
        }
        Ok(value)
    }

    pub fn write(&mut self, reason: &str, value: PvValue) -> EngineResult<WriteOutcome> {
        let route = self.mode.route_write(reason);
        debug!(reason, ?route, %value, "legacy write");
        match route {
            Route::Engine => {
                self.accelerator.set_pvs([(reason, value.clone())])?;
                self.params.insert(reason.to_string(), value);
                Ok(WriteOutcome::Simulated)
            }
            Route::Param => {
                self.params.insert(reason.to_string(), value);
                Ok(WriteOutcome::Stored)
            }
            Route::Ignore => Ok(WriteOutcome::Ignored),
            Route::Refuse => {
                warn!(reason, "write to OTRS PVs is disabled");
                Ok(WriteOutcome::Refused)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn historical_routing_matches_any_bctrl() {
        let mode = RoutingMode::Historical;
        assert_eq!(mode.route_write("QUAD:DIAG0:190:BCTRL"), Route::Engine);
        assert_eq!(mode.route_write("XCOR:DIAG0:178:BCTRL"), Route::Engine);
        assert_eq!(mode.route_write("SOLN:GUNB:212:BCTRL"), Route::Engine);
        assert_eq!(mode.route_write("QUAD:DIAG0:190:BDES"), Route::Param);
    }

    #[test]
    fn structured_routing_needs_quad_device() {
        let mode = RoutingMode::Structured;
        assert_eq!(mode.route_write("QUAD:DIAG0:190:BCTRL"), Route::Engine);
        assert_eq!(mode.route_write("XCOR:DIAG0:178:BCTRL"), Route::Param);
        assert_eq!(mode.route_read("XCOR:DIAG0:178:BCTRL"), Route::Param);
        assert_eq!(
            mode.route_read("OTRS:DIAG0:420:Image:ArrayData"),
            Route::Engine
        );
    }

    #[test]
    fn stored_values_compare_within_tolerance() {
        assert!(same_value(&PvValue::Float(0.3), &PvValue::Float(0.1 + 0.2)));
        assert!(same_value(&PvValue::Int(2), &PvValue::Float(2.0)));
        assert!(!same_value(&PvValue::Float(0.3), &PvValue::Float(0.31)));
        assert!(!same_value(
            &PvValue::Array(vec![1.0]),
            &PvValue::Array(vec![2.0])
        ));
    }

    #[test]
    fn bact_and_otrs_writes_in_both_modes() {
        for mode in [RoutingMode::Historical, RoutingMode::Structured] {
            assert_eq!(mode.route_write("QUAD:DIAG0:190:BACT"), Route::Ignore);
            assert_eq!(mode.route_write("OTRS:DIAG0:420:PNEUMATIC"), Route::Refuse);
        }
    }
}
