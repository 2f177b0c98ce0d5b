//! PV database description for the transport layer.
//!
//! Mirrors what a Channel Access server needs to create its PVs: type,
//! initial value, display and drive limits, enum strings.

use std::collections::BTreeMap;

use serde::Serialize;
use va_pv::PvValue;

use crate::devices::{DeviceCategory, DeviceMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PvType {
    Float,
    Int,
    Enum,
}

/// One PV definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PvSpec {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub pv_type: Option<PvType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<PvValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prec: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hopr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lopr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drvh: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drvl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl PvSpec {
    fn float(value: f64, prec: u32) -> Self {
        Self {
            pv_type: Some(PvType::Float),
            value: Some(PvValue::Float(value)),
            prec: Some(prec),
            ..Default::default()
        }
    }

    fn int(value: i64) -> Self {
        Self {
            pv_type: Some(PvType::Int),
            value: Some(PvValue::Int(value)),
            ..Default::default()
        }
    }

    fn enumeration(choices: &[&str]) -> Self {
        Self {
            pv_type: Some(PvType::Enum),
            enums: choices.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Float with `±limit` display and drive limits.
    fn limited(limit: f64, prec: u32) -> Self {
        Self {
            hopr: Some(limit),
            lopr: Some(-limit),
            drvh: Some(limit),
            drvl: Some(-limit),
            ..Self::float(0.0, prec)
        }
    }

    /// Field PVs (`.HOPR`, `.PREC`, ...) the server does not create itself.
    fn field_pvs(&self) -> Vec<(&'static str, f64)> {
        [
            ("PREC", self.prec.map(f64::from)),
            ("HOPR", self.hopr),
            ("LOPR", self.lopr),
            ("DRVH", self.drvh),
            ("DRVL", self.drvl),
        ]
        .into_iter()
        .filter_map(|(field, v)| v.map(|v| (field, v)))
        .collect()
    }
}

/// PV name to definition, sorted by name.
pub type PvDatabase = BTreeMap<String, PvSpec>;

/// Screen geometry used when the device file does not give one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PvDefaults {
    pub n_row: usize,
    pub n_col: usize,
    /// um/px
    pub resolution: f64,
}

impl Default for PvDefaults {
    fn default() -> Self {
        Self {
            n_row: 1944,
            n_col: 1472,
            resolution: 23.33,
        }
    }
}

const MAGNET_LIMIT: f64 = 20.0;

/// Build the PV database for every device in `devices`.
///
/// PV names come from each device's `pvs` table; a key with no entry gets
/// `{control}:missing_{key}`.
pub fn create_pvdb(devices: &DeviceMap, defaults: &PvDefaults) -> PvDatabase {
    let mut db = PvDatabase::new();
    for (control, device) in devices.iter() {
        let pv = |key: &str| {
            device
                .pvs
                .get(key)
                .cloned()
                .unwrap_or_else(|| format!("{control}:missing_{key}"))
        };

        match device.category {
            DeviceCategory::Magnet => {
                let mut specs = vec![
                    (pv("bact"), PvSpec::limited(MAGNET_LIMIT, 5)),
                    (pv("bctrl"), PvSpec::limited(MAGNET_LIMIT, 5)),
                    (pv("bmax"), PvSpec::float(MAGNET_LIMIT, 5)),
                    (pv("bmin"), PvSpec::float(-MAGNET_LIMIT, 5)),
                    (pv("bdes"), PvSpec::limited(MAGNET_LIMIT, 5)),
                    (pv("bcon"), PvSpec::limited(MAGNET_LIMIT, 5)),
                    (
                        pv("ctrl"),
                        PvSpec::enumeration(&["Ready", "TRIM", "Perturb", "MORE_IF_NEEDED"]),
                    ),
                ];
                let fields: Vec<_> = specs
                    .iter()
                    .flat_map(|(name, spec)| {
                        spec.field_pvs().into_iter().map(move |(field, v)| {
                            (format!("{name}.{field}"), PvSpec {
                                pv_type: Some(PvType::Float),
                                value: Some(PvValue::Float(v)),
                                ..Default::default()
                            })
                        })
                    })
                    .collect();
                specs.extend(fields);
                db.extend(specs);
            }
            DeviceCategory::Screen => {
                let n_row = defaults.n_row;
                let n_col = defaults.n_col;
                db.insert(
                    pv("image"),
                    PvSpec {
                        pv_type: Some(PvType::Float),
                        count: Some(n_row * n_col),
                        ..Default::default()
                    },
                );
                db.insert(pv("n_row"), PvSpec::int(n_row as i64));
                db.insert(pv("n_col"), PvSpec::int(n_col as i64));
                db.insert(
                    pv("resolution"),
                    PvSpec {
                        value: Some(PvValue::Float(defaults.resolution)),
                        unit: Some("um/px".to_string()),
                        ..Default::default()
                    },
                );
                db.insert(pv("pneumatic"), PvSpec::enumeration(&["OUT", "IN"]));
            }
            DeviceCategory::Tcav => {
                let enable = ["Disable", "Enable"];
                let feedback = ["Disable", "Pause", "Feedforward", "Enable"];
                db.insert(pv("amp_fbenb"), PvSpec::enumeration(&enable));
                db.insert(pv("amp_fbst"), PvSpec::enumeration(&feedback));
                db.insert(pv("phase_fbenb"), PvSpec::enumeration(&enable));
                db.insert(pv("phase_fbst"), PvSpec::enumeration(&feedback));
                db.insert(pv("rf_enable"), PvSpec::enumeration(&enable));
                db.insert(
                    pv("amp_set"),
                    PvSpec {
                        pv_type: None,
                        ..PvSpec::float(0.0, 5)
                    },
                );
                db.insert(
                    pv("phase_set"),
                    PvSpec {
                        pv_type: None,
                        ..PvSpec::float(0.0, 5)
                    },
                );
                db.insert(
                    pv("mode_config"),
                    PvSpec::enumeration(&["Disable", "ACCEL", "STDBY"]),
                );
            }
            DeviceCategory::Bpm => {
                db.insert(pv("x"), PvSpec::float(0.0, 5));
                db.insert(pv("y"), PvSpec::float(0.0, 5));
            }
        }
    }
    db
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::DeviceConfig;

    fn devices() -> DeviceMap {
        let yaml = r#"
magnets:
  QM01:
    metadata: { type: QUAD }
    controls_information:
      control_name: "QUAD:DIAG0:190"
      PVs: { bctrl: "QUAD:DIAG0:190:BCTRL" }
screens:
  OTR1:
    metadata: { type: PROF }
    controls_information:
      control_name: "OTRS:DIAG0:420"
      PVs: { image: "OTRS:DIAG0:420:Image:ArrayData", pneumatic: "OTRS:DIAG0:420:PNEUMATIC" }
"#;
        let config: DeviceConfig = serde_yaml::from_str(yaml).unwrap();
        DeviceMap::from_config(&config)
    }

    #[test]
    fn magnet_pvs_with_field_pvs() {
        let db = create_pvdb(&devices(), &PvDefaults::default());
        let bctrl = &db["QUAD:DIAG0:190:BCTRL"];
        assert_eq!(bctrl.pv_type, Some(PvType::Float));
        assert_eq!(bctrl.hopr, Some(20.0));
        assert_eq!(bctrl.drvl, Some(-20.0));
        assert_eq!(
            db["QUAD:DIAG0:190:BCTRL.HOPR"].value,
            Some(PvValue::Float(20.0))
        );
        assert_eq!(
            db["QUAD:DIAG0:190:BCTRL.PREC"].value,
            Some(PvValue::Float(5.0))
        );
        // names missing from the device file get a placeholder
        assert!(db.contains_key("QUAD:DIAG0:190:missing_bact"));
        assert!(db.contains_key("QUAD:DIAG0:190:missing_bmax.PREC"));
        assert!(!db.contains_key("QUAD:DIAG0:190:missing_ctrl.PREC"));
        assert_eq!(db["QUAD:DIAG0:190:missing_ctrl"].enums.len(), 4);
    }

    #[test]
    fn screen_pvs_use_defaults() {
        let defaults = PvDefaults {
            n_row: 4,
            n_col: 5,
            resolution: 10.0,
        };
        let db = create_pvdb(&devices(), &defaults);
        assert_eq!(db["OTRS:DIAG0:420:Image:ArrayData"].count, Some(20));
        assert_eq!(db["OTRS:DIAG0:420:PNEUMATIC"].enums, vec!["OUT", "IN"]);
        assert_eq!(
            db["OTRS:DIAG0:420:missing_resolution"].unit.as_deref(),
            Some("um/px")
        );
    }

    #[test]
    fn serializes_without_empty_fields() {
        let db = create_pvdb(&devices(), &PvDefaults::default());
        let json = serde_json::to_value(&db["OTRS:DIAG0:420:PNEUMATIC"]).unwrap();
        assert_eq!(json, serde_json::json!({"type": "enum", "enums": ["OUT", "IN"]}));
    }
}
