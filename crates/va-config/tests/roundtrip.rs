use std::path::PathBuf;

use va_config::*;

fn config() -> AcceleratorConfig {
    AcceleratorConfig {
        lattice: PathBuf::from("/opt/va/diag0.json"),
        mapping: MappingSource::Csv(PathBuf::from("/opt/va/mapping.csv")),
        shutter_pv: Some("IOC:BSY0:MP01:BYKIK_RATE".to_string()),
        poll_period_ms: 250,
        beam: BeamDef {
            energy_ev: 9.0e7,
            num_particles: 2_000,
            seed: 11,
            ..Default::default()
        },
    }
}

#[test]
fn roundtrip_yaml_config() {
    let config = config();
    validate_config(&config).unwrap();

    let path = std::env::temp_dir().join("va_config_roundtrip.yaml");
    save_yaml(&path, &config).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(config, loaded);
}

#[test]
fn invalid_config_is_not_saved() {
    let mut config = config();
    config.beam.num_particles = 0;
    let path = std::env::temp_dir().join("va_config_invalid.yaml");
    assert!(matches!(
        save_yaml(&path, &config),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn pvdb_from_device_file() {
    let path = std::env::temp_dir().join("va_config_devices.yaml");
    std::fs::write(
        &path,
        r#"
magnets:
  XC01:
    metadata: { type: XCOR }
    controls_information:
      control_name: "XCOR:DIAG0:178"
      PVs: { bctrl: "XCOR:DIAG0:178:BCTRL", bact: "XCOR:DIAG0:178:BACT" }
bpms:
  BPM1:
    metadata: { type: BPM }
    controls_information:
      control_name: "BPMS:DIAG0:190"
      PVs: { x: "BPMS:DIAG0:190:XSCDT1H" }
"#,
    )
    .unwrap();

    let devices = load_relevant_controls(&path).unwrap();
    assert_eq!(devices.len(), 2);

    let db = create_pvdb(&devices, &PvDefaults::default());
    assert_eq!(db["XCOR:DIAG0:178:BCTRL"].drvh, Some(20.0));
    assert!(db.contains_key("XCOR:DIAG0:178:BCTRL.PREC"));
    assert!(db.contains_key("BPMS:DIAG0:190:XSCDT1H"));
    assert!(db.contains_key("BPMS:DIAG0:190:missing_y"));

    let names = devices.control_name_map();
    assert_eq!(names.resolve("BPMS:DIAG0:190").unwrap(), ["bpm1"]);
}
