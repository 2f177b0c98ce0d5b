//! The virtual accelerator engine.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, warn};
use va_core::timing::Timer;
use va_core::ElementIdx;
use va_core::units::{Energy, as_ev};
use va_config::AcceleratorConfig;
use va_lattice::{Element, Segment, load_lattice};
use va_pv::{Access, ControlNameMap, PvValue, registry};
use va_sim::{LinearTracker, ParticleBeam, Simulator};

use crate::error::{EngineError, EngineResult};

/// PV name to value, as returned by [`VirtualAccelerator::get_pvs`].
pub type PvValues = BTreeMap<String, PvValue>;

/// Beam energy at the entrance of every element, in segment order.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyProfile {
    entries: Vec<(String, Energy)>,
}

impl EnergyProfile {
    pub fn at(&self, idx: ElementIdx) -> Option<Energy> {
        self.entries.get(idx.slot()).map(|(_, e)| *e)
    }

    /// Energy at the first element called `name`.
    pub fn by_name(&self, name: &str) -> Option<Energy> {
        let name = name.to_lowercase();
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, e)| *e)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Energy)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), *e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Owns the segment and beam, and answers PV reads and writes against them.
///
/// Every write batch ends with exactly one simulation pass; reads never
/// simulate. A control name bound to several elements is written to all of
/// them and read from the first.
#[derive(Debug)]
pub struct VirtualAccelerator<S: Simulator = LinearTracker> {
    segment: Segment,
    mapping: ControlNameMap,
    simulator: S,
    initial_beam: ParticleBeam,
    /// Charges of the incoming beam as given, restored when the shutter opens.
    retained_charges: Vec<f64>,
    tracked_beam: ParticleBeam,
    shutter_pv: Option<String>,
    shutter_closed: bool,
}

impl VirtualAccelerator<LinearTracker> {
    /// Build with the default tracker and run the first simulation.
    pub fn new(segment: Segment, mapping: ControlNameMap, beam: ParticleBeam) -> EngineResult<Self> {
        Self::with_simulator(segment, mapping, beam, LinearTracker)
    }

    /// Load the lattice and the CSV mapping from disk.
    pub fn from_files(lattice: &Path, mapping: &Path, beam: ParticleBeam) -> EngineResult<Self> {
        let segment = load_lattice(lattice)?;
        let mapping = ControlNameMap::load_csv(mapping)?;
        Self::new(segment, mapping, beam)
    }

    /// Bring up everything an accelerator config describes.
    pub fn from_config(config: &AcceleratorConfig) -> EngineResult<Self> {
        let segment = config.load_lattice()?;
        let mapping = config.load_mapping()?;
        let beam = config.beam.build()?;
        let mut va = Self::new(segment, mapping, beam)?;
        va.shutter_pv = config.shutter_pv.clone();
        Ok(va)
    }
}

impl<S: Simulator> VirtualAccelerator<S> {
    pub fn with_simulator(
        segment: Segment,
        mapping: ControlNameMap,
        beam: ParticleBeam,
        simulator: S,
    ) -> EngineResult<Self> {
        let dangling = mapping
            .iter()
            .filter(|(_, elements)| !elements.iter().any(|e| segment.contains(e)))
            .count();
        if dangling > 0 {
            warn!(
                dangling,
                mapped = mapping.len(),
                "control names with no element in the segment"
            );
        }

        let retained_charges = beam.charges().to_vec();
        let mut va = Self {
            tracked_beam: beam.clone(),
            segment,
            mapping,
            simulator,
            initial_beam: beam,
            retained_charges,
            shutter_pv: None,
            shutter_closed: false,
        };
        va.simulate()?;
        info!(
            segment = va.segment.name(),
            elements = va.segment.len(),
            controls = va.mapping.len(),
            "virtual accelerator initialized"
        );
        Ok(va)
    }

    /// Route writes and reads of `pv` to the shutter.
    pub fn with_shutter_pv(mut self, pv: impl Into<String>) -> Self {
        self.shutter_pv = Some(pv.into());
        self
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    pub fn mapping(&self) -> &ControlNameMap {
        &self.mapping
    }

    pub fn initial_beam(&self) -> &ParticleBeam {
        &self.initial_beam
    }

    /// Beam at the end of the segment after the last simulation pass.
    pub fn tracked_beam(&self) -> &ParticleBeam {
        &self.tracked_beam
    }

    pub fn shutter_pv(&self) -> Option<&str> {
        self.shutter_pv.as_deref()
    }

    pub fn shutter_closed(&self) -> bool {
        self.shutter_closed
    }

    /// Beam energy at every element, from a zero-charge probe.
    pub fn energy_profile(&self) -> EngineResult<EnergyProfile> {
        let energies = self
            .simulator
            .energy_profile(&self.segment, self.initial_beam.energy())?;
        let entries = self
            .segment
            .elements()
            .iter()
            .zip(energies)
            .map(|(e, energy)| (e.name.clone(), energy))
            .collect();
        Ok(EnergyProfile { entries })
    }

    /// Apply a batch of writes, then simulate once.
    ///
    /// Requests are applied in order. A request bound to paired elements is
    /// converted for all of them before any is written. The first failure is
    /// returned at once; earlier requests stay in place and the simulation
    /// is not run.
    pub fn set_pvs<I, K>(&mut self, requests: I) -> EngineResult<()>
    where
        I: IntoIterator<Item = (K, PvValue)>,
        K: AsRef<str>,
    {
        let timer = Timer::start();
        let mut profile: Option<EnergyProfile> = None;
        let mut applied = 0usize;

        for (pv, value) in requests {
            let pv = pv.as_ref();
            if self.is_shutter(pv) {
                let closed = value
                    .as_bool()
                    .map_err(EngineError::pv(pv, Access::Write))?;
                self.apply_shutter(closed)?;
                applied += 1;
                continue;
            }

            let (control, attribute) = self
                .mapping
                .split(pv)
                .map_err(EngineError::pv(pv, Access::Write))?;
            let targets = self.targets(control)?;
            let energies = match profile.take() {
                Some(energies) => energies,
                None => self.energy_profile()?,
            };

            // Convert for every paired element first so a failure leaves
            // all of them untouched.
            let mut writes = Vec::with_capacity(targets.len());
            for idx in targets {
                let element = self.element(control, idx)?;
                let energy = energies
                    .at(idx)
                    .unwrap_or_else(|| self.initial_beam.energy());
                let accessor = registry::resolve(element.element_type(), attribute, Access::Write)
                    .map_err(EngineError::pv(pv, Access::Write))?;
                let write = accessor
                    .convert(element, energy, &value)
                    .map_err(EngineError::pv(pv, Access::Write))?;
                writes.push((idx, energy, write));
            }

            for (idx, energy, write) in writes {
                let element = self.segment.element_mut(idx).ok_or_else(|| {
                    EngineError::MissingElement {
                        control: control.to_string(),
                        elements: format!("index {}", idx.slot()),
                    }
                })?;
                write
                    .apply(element)
                    .map_err(EngineError::pv(pv, Access::Write))?;
                debug!(
                    pv,
                    element = %element.name,
                    energy_ev = as_ev(energy),
                    %value,
                    "set"
                );
            }
            profile = Some(energies);
            applied += 1;
        }

        self.simulate()?;
        debug!(
            requests = applied,
            elapsed_s = timer.stop(),
            "write batch applied"
        );
        Ok(())
    }

    /// Read PVs from the current state. Never simulates.
    pub fn get_pvs<I, K>(&self, names: I) -> EngineResult<PvValues>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut profile: Option<EnergyProfile> = None;
        let mut values = PvValues::new();

        for pv in names {
            let pv = pv.as_ref();
            if self.is_shutter(pv) {
                values.insert(pv.to_string(), PvValue::Bool(self.shutter_closed));
                continue;
            }

            let (control, attribute) = self
                .mapping
                .split(pv)
                .map_err(EngineError::pv(pv, Access::Read))?;
            let idx = self.targets(control)?[0];
            let element = self.element(control, idx)?;
            let accessor = registry::resolve(element.element_type(), attribute, Access::Read)
                .map_err(EngineError::pv(pv, Access::Read))?;

            if profile.is_none() {
                profile = Some(self.energy_profile()?);
            }
            let energy = profile
                .as_ref()
                .and_then(|p| p.at(idx))
                .unwrap_or_else(|| self.initial_beam.energy());
            let value = accessor
                .get(element, energy)
                .map_err(EngineError::pv(pv, Access::Read))?;
            values.insert(pv.to_string(), value);
        }
        Ok(values)
    }

    /// Close (`true`) or open the beam shutter, then simulate.
    ///
    /// Closing zeroes the incoming charge; opening restores the charge the
    /// beam was created with. Coordinates and energy are never touched.
    pub fn set_shutter(&mut self, closed: bool) -> EngineResult<()> {
        self.apply_shutter(closed)?;
        self.simulate()
    }

    /// Re-run the simulation without changing any setting.
    pub fn refresh(&mut self) -> EngineResult<()> {
        self.simulate()
    }

    /// Replace the segment and incoming beam, reopen the shutter and
    /// simulate. The mapping and shutter PV are kept.
    pub fn reset(&mut self, segment: Segment, beam: ParticleBeam) -> EngineResult<()> {
        self.retained_charges = beam.charges().to_vec();
        self.tracked_beam = beam.clone();
        self.initial_beam = beam;
        self.segment = segment;
        self.shutter_closed = false;
        info!(segment = self.segment.name(), "virtual accelerator reset");
        self.simulate()
    }

    fn is_shutter(&self, pv: &str) -> bool {
        self.shutter_pv.as_deref() == Some(pv)
    }

    fn apply_shutter(&mut self, closed: bool) -> EngineResult<()> {
        if closed {
            self.initial_beam.zero_charge();
        } else {
            self.initial_beam
                .set_charges(self.retained_charges.clone())?;
        }
        if closed != self.shutter_closed {
            info!(closed, "beam shutter");
        }
        self.shutter_closed = closed;
        Ok(())
    }

    /// Segment indices of every element bound to `control`, mapping order
    /// first, then segment order.
    fn targets(&self, control: &str) -> EngineResult<Vec<ElementIdx>> {
        let names = self.mapping.resolve(control)?;
        let targets: Vec<ElementIdx> = names
            .iter()
            .flat_map(|name| self.segment.find(name).iter().copied())
            .collect();
        if targets.is_empty() {
            return Err(EngineError::MissingElement {
                control: control.to_string(),
                elements: names.join(", "),
            });
        }
        Ok(targets)
    }

    fn element(&self, control: &str, idx: ElementIdx) -> EngineResult<&Element> {
        self.segment
            .element(idx)
            .ok_or_else(|| EngineError::MissingElement {
                control: control.to_string(),
                elements: format!("index {}", idx.slot()),
            })
    }

        fn simulate(&mut self) -> EngineResult<()> {
        let timer = Timer::start();
        self.tracked_beam = self.simulator.track(&mut self.segment, &self.initial_beam)?;
        if let Some(elapsed) = timer.stop() {
            debug!(elapsed_s = elapsed, "simulate");
        }
        Ok(())
    }
}
