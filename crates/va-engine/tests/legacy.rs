//! Legacy driver against a live engine.

use va_core::constants::RIGIDITY_KG_M_PER_GEV;
use va_core::units::ev;
use va_engine::{LegacyDriver, RoutingMode, SharedAccelerator, VirtualAccelerator, WriteOutcome};
use va_lattice::{ElementKind, Param, SegmentBuilder};
use va_pv::{ControlNameMap, PvValue};
use va_sim::{BeamOptions, ParticleBeam, TwissParameters};

fn shared() -> SharedAccelerator {
    let mut b = SegmentBuilder::new("in20");
    b.add("qe01", ElementKind::quadrupole(1.0, 0.0));
    b.add("xc01", ElementKind::horizontal_corrector(0.1, 0.0));
    b.add("d", ElementKind::drift(1.0));
    b.add("otr2", ElementKind::screen([16, 16], [1e-4, 1e-4]));
    let segment = b.build().unwrap();
    let mapping = ControlNameMap::from_pairs([
        ("QUAD:IN20:425", "qe01"),
        ("XCOR:IN20:221", "xc01"),
        ("OTRS:IN20:571", "otr2"),
    ]);
    let opts = BeamOptions {
        // Bρ = 1 kG·m
        energy: ev(1e9 / RIGIDITY_KG_M_PER_GEV),
        num_particles: 500,
        ..Default::default()
    };
    let beam = ParticleBeam::from_twiss(&TwissParameters::default(), &opts).unwrap();
    SharedAccelerator::new(VirtualAccelerator::new(segment, mapping, beam).unwrap())
}

fn k1(va: &SharedAccelerator, name: &str) -> f64 {
    va.with(|engine| {
        let idx = engine.segment().find(name)[0];
        engine.segment().element(idx).unwrap().param(Param::K1).unwrap()
    })
    .unwrap()
}

#[test]
fn quad_setpoint_reaches_simulation() {
    let va = shared();
    let mut driver = LegacyDriver::new(va.clone(), RoutingMode::Historical);

    let outcome = driver
        .write("QUAD:IN20:425:BCTRL", PvValue::Float(0.7))
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Simulated);
    assert!((k1(&va, "qe01") - 0.7).abs() < 1e-12);

    let read = driver.read("QUAD:IN20:425:BCTRL").unwrap();
    assert!((read.unwrap().as_real().unwrap() - 0.7).abs() < 1e-12);
}

#[test]
fn bact_write_is_a_no_op() {
    let va = shared();
    let mut driver = LegacyDriver::new(va.clone(), RoutingMode::Historical);
    driver.set_param("QUAD:IN20:425:BACT", PvValue::Float(0.0));

    let outcome = driver
        .write("QUAD:IN20:425:BACT", PvValue::Float(5.0))
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Ignored);
    assert_eq!(
        driver.read("QUAD:IN20:425:BACT").unwrap(),
        Some(PvValue::Float(0.0))
    );
    assert_eq!(k1(&va, "qe01"), 0.0);
}

#[test]
fn otrs_writes_are_refused() {
    let mut driver = LegacyDriver::new(shared(), RoutingMode::Historical);
    let outcome = driver
        .write("OTRS:IN20:571:PNEUMATIC", PvValue::Bool(false))
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Refused);
    assert_eq!(driver.get_param("OTRS:IN20:571:PNEUMATIC"), None);
}

#[test]
fn image_reads_come_from_engine() {
    let driver = LegacyDriver::new(shared(), RoutingMode::Structured);
    match driver.read("OTRS:IN20:571:Image:ArrayData").unwrap() {
        Some(PvValue::Array(image)) => assert_eq!(image.len(), 256),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn corrector_routing_depends_on_mode() {
    let va = shared();

    let mut historical = LegacyDriver::new(va.clone(), RoutingMode::Historical);
    assert_eq!(
        historical
            .write("XCOR:IN20:221:BCTRL", PvValue::Float(0.01))
            .unwrap(),
        WriteOutcome::Simulated
    );

    let mut structured = LegacyDriver::new(va.clone(), RoutingMode::Structured);
    assert_eq!(
        structured
            .write("XCOR:IN20:221:BCTRL", PvValue::Float(0.02))
            .unwrap(),
        WriteOutcome::Stored
    );

    let angle = va
        .with(|engine| {
            let idx = engine.segment().find("xc01")[0];
            engine.segment().element(idx).unwrap().param(Param::Angle).unwrap()
        })
        .unwrap();
    assert!((angle - 0.01).abs() < 1e-12);
}
