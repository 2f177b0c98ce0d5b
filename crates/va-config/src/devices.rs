//! Device YAML loader.
//!
//! A device file groups devices by category:
//!
//! ```yaml
//! magnets:
//!   QM01:
//!     metadata: { type: QUAD, area: DIAG0 }
//!     controls_information:
//!       control_name: QUAD:DIAG0:190
//!       PVs: { bctrl: "QUAD:DIAG0:190:BCTRL", bact: "QUAD:DIAG0:190:BACT" }
//! screens: { ... }
//! tcavs: { ... }
//! bpms: { ... }
//! ```
//!
//! Only devices the virtual accelerator can drive are kept.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use va_pv::ControlNameMap;

use crate::ConfigResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    #[serde(default)]
    pub magnets: BTreeMap<String, DeviceDef>,
    #[serde(default)]
    pub screens: BTreeMap<String, DeviceDef>,
    #[serde(default)]
    pub tcavs: BTreeMap<String, DeviceDef>,
    #[serde(default)]
    pub bpms: BTreeMap<String, DeviceDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceDef {
    pub metadata: DeviceMetadata,
    pub controls_information: ControlsInformation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceMetadata {
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlsInformation {
    pub control_name: String,
    #[serde(rename = "PVs", default)]
    pub pvs: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCategory {
    Magnet,
    Screen,
    Tcav,
    Bpm,
}

impl DeviceCategory {
    /// Device types kept for this category.
    fn accepts(self, device_type: &str) -> bool {
        match self {
            Self::Magnet => matches!(device_type, "QUAD" | "XCOR" | "YCOR" | "SOLE"),
            Self::Screen => device_type == "PROF",
            Self::Tcav => device_type == "LCAV",
            Self::Bpm => device_type == "BPM",
        }
    }
}

/// A device kept by [`load_relevant_controls`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceEntry {
    pub category: DeviceCategory,
    /// Short PV key (`bctrl`, `image`, ...) to full PV name
    pub pvs: BTreeMap<String, String>,
    pub metadata: DeviceMetadata,
    /// Lattice element name, lower-cased
    pub madname: String,
}

/// Devices keyed by control name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceMap {
    devices: BTreeMap<String, DeviceEntry>,
}

impl DeviceMap {
    pub fn from_config(config: &DeviceConfig) -> Self {
        let groups = [
            (DeviceCategory::Magnet, &config.magnets),
            (DeviceCategory::Screen, &config.screens),
            (DeviceCategory::Tcav, &config.tcavs),
            (DeviceCategory::Bpm, &config.bpms),
        ];
        let mut devices = BTreeMap::new();
        for (category, group) in groups {
            for (name, def) in group {
                if !category.accepts(&def.metadata.device_type) {
                    continue;
                }
                devices.insert(
                    def.controls_information.control_name.clone(),
                    DeviceEntry {
                        category,
                        pvs: def.controls_information.pvs.clone(),
                        metadata: def.metadata.clone(),
                        madname: name.to_lowercase(),
                    },
                );
            }
        }
        Self { devices }
    }

    pub fn get(&self, control_name: &str) -> Option<&DeviceEntry> {
        self.devices.get(control_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeviceEntry)> {
        self.devices.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Control name to MAD element name table for the engine.
    pub fn control_name_map(&self) -> ControlNameMap {
        ControlNameMap::from_pairs(
            self.devices
                .iter()
                .map(|(control, entry)| (control.clone(), entry.madname.as_str())),
        )
    }
}

/// Read a device YAML file and keep the devices the accelerator can drive.
pub fn load_relevant_controls(path: &Path) -> ConfigResult<DeviceMap> {
    let content = std::fs::read_to_string(path)?;
    let config: DeviceConfig = serde_yaml::from_str(&content)?;
    Ok(DeviceMap::from_config(&config))
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
magnets:
  QM01:
    metadata: { type: QUAD, area: DIAG0, sum_l_meters: 12.5 }
    controls_information:
      control_name: "QUAD:DIAG0:190"
      PVs: { bctrl: "QUAD:DIAG0:190:BCTRL", bact: "QUAD:DIAG0:190:BACT" }
  BEND1:
    metadata: { type: BEND }
    controls_information:
      control_name: "BEND:DIAG0:100"
screens:
  OTRDG02:
    metadata: { type: PROF }
    controls_information:
      control_name: "OTRS:DIAG0:420"
      PVs: { image: "OTRS:DIAG0:420:Image:ArrayData" }
  WIRE1:
    metadata: { type: WIRE }
    controls_information:
      control_name: "WIRE:DIAG0:1"
"#;

    #[test]
    fn keeps_only_drivable_devices() {
        let config: DeviceConfig = serde_yaml::from_str(YAML).unwrap();
        let map = DeviceMap::from_config(&config);
        assert_eq!(map.len(), 2);

        let quad = map.get("QUAD:DIAG0:190").unwrap();
        assert_eq!(quad.category, DeviceCategory::Magnet);
        assert_eq!(quad.madname, "qm01");
        assert_eq!(quad.pvs["bctrl"], "QUAD:DIAG0:190:BCTRL");
        assert!(quad.metadata.extra.contains_key("area"));
        assert!(map.get("BEND:DIAG0:100").is_none());
        assert!(map.get("WIRE:DIAG0:1").is_none());
    }

    #[test]
    fn builds_control_name_map() {
        let config: DeviceConfig = serde_yaml::from_str(YAML).unwrap();
        let names = DeviceMap::from_config(&config).control_name_map();
        assert_eq!(names.resolve("OTRS:DIAG0:420").unwrap(), ["otrdg02"]);
    }
}
