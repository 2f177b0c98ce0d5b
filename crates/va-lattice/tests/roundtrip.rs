use va_lattice::{ElementKind, ElementType, LatticeDef, SegmentBuilder, load_lattice, save_json};

#[test]
fn roundtrip_json_preserves_order_and_parameters() {
    let mut builder = SegmentBuilder::new("roundtrip");
    builder.add("d1", ElementKind::drift(1.0));
    builder.add("qa", ElementKind::quadrupole(0.05, 1.25));
    builder.add("xc1", ElementKind::horizontal_corrector(0.1, 1e-3));
    builder.add("qa", ElementKind::quadrupole(0.05, 1.25));
    builder.add("bpm1", ElementKind::bpm());
    builder.add("tcav", ElementKind::tcav(0.5, 1e6, 90.0));
    builder.add("otr1", ElementKind::screen([20, 10], [1e-4, 1e-4]));
    let segment = builder.build().unwrap();

    let path = std::env::temp_dir().join("va_lattice_roundtrip.json");
    save_json(&path, &segment).unwrap();
    let loaded = load_lattice(&path).unwrap();

    assert_eq!(loaded.name(), "roundtrip");
    assert_eq!(loaded.elements(), segment.elements());
    assert_eq!(loaded.find("qa").len(), 2);
    assert_eq!(
        LatticeDef::from_segment(&loaded),
        LatticeDef::from_segment(&segment)
    );
}

#[test]
fn yaml_lattice_loads_by_extension() {
    let yaml = r#"
name: diag0
elements:
  - { name: D0, type: Drift, length: 0.5 }
  - { name: SOL1, type: Solenoid, length: 0.2, k: 0.4 }
  - { name: YC1, type: VerticalCorrector, length: 0.1 }
  - { name: ACC1, type: Cavity, length: 1.0, voltage: 1.0e7 }
  - { name: BPM1, type: BPM }
"#;
    let path = std::env::temp_dir().join("va_lattice_load.yaml");
    std::fs::write(&path, yaml).unwrap();

    let seg = load_lattice(&path).unwrap();
    let types: Vec<ElementType> = seg.elements().iter().map(|e| e.element_type()).collect();
    assert_eq!(
        types,
        vec![
            ElementType::Drift,
            ElementType::Solenoid,
            ElementType::VerticalCorrector,
            ElementType::Cavity,
            ElementType::Bpm,
        ]
    );
    assert!(seg.contains("sol1"));
}

#[test]
fn unknown_extension_is_rejected() {
    let path = std::env::temp_dir().join("va_lattice_load.txt");
    std::fs::write(&path, "").unwrap();
    assert!(load_lattice(&path).is_err());
}
