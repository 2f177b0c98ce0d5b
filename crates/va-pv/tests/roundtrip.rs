//! Set-then-get round trips through the accessor registry.

use proptest::prelude::*;
use va_core::units::ev;
use va_lattice::{Element, ElementKind};
use va_pv::registry::{self, entries};
use va_pv::{Access, PvValue};

fn writable_elements() -> Vec<Element> {
    vec![
        Element::new("q", ElementKind::quadrupole(0.3, 1.0)),
        Element::new("sol", ElementKind::solenoid(0.5, 0.2)),
        Element::new("xc", ElementKind::horizontal_corrector(0.1, 0.0)),
        Element::new("yc", ElementKind::vertical_corrector(0.1, 0.0)),
        Element::new("tcav", ElementKind::tcav(0.5, 0.0, 0.0)),
    ]
}

#[test]
fn every_table_has_unique_attributes() {
    for element in writable_elements() {
        let table = entries(element.element_type());
        for (i, a) in table.iter().enumerate() {
            assert!(
                table[i + 1..].iter().all(|b| b.attribute != a.attribute),
                "duplicate {} for {}",
                a.attribute,
                element.element_type()
            );
        }
    }
}

proptest! {
    #[test]
    fn writable_scalars_round_trip(value in -10.0f64..10.0, energy_ev in 1.0e6f64..2.0e10) {
        let energy = ev(energy_ev);
        for mut element in writable_elements() {
            for accessor in entries(element.element_type()).iter().filter(|a| a.is_writable()) {
                let resolved = registry::resolve(element.element_type(), accessor.attribute, Access::Write).unwrap();
                resolved.set(&mut element, energy, &PvValue::Float(value)).unwrap();
                let back = resolved.get(&element, energy).unwrap().as_real().unwrap();
                prop_assert!(
                    (back - value).abs() <= 1e-9 * value.abs().max(1.0),
                    "{}:{} wrote {} read {}", element.name, accessor.attribute, value, back
                );
            }
        }
    }

    #[test]
    fn pneumatic_round_trips(inserted in any::<bool>()) {
        let mut screen = Element::new("otr", ElementKind::screen([4, 4], [1e-3, 1e-3]));
        let accessor = registry::resolve(screen.element_type(), "PNEUMATIC", Access::Write).unwrap();
        accessor.set(&mut screen, ev(1e9), &PvValue::Bool(inserted)).unwrap();
        prop_assert_eq!(accessor.get(&screen, ev(1e9)).unwrap(), PvValue::Bool(inserted));
    }
}
