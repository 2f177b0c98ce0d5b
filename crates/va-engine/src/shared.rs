//! Serialized access for a transport layer.

use std::sync::{Arc, Mutex, MutexGuard};

use va_pv::PvValue;
use va_sim::{LinearTracker, Simulator};

use crate::engine::{EnergyProfile, PvValues, VirtualAccelerator};
use crate::error::{EngineError, EngineResult};

/// Cloneable handle to one [`VirtualAccelerator`].
///
/// Each call holds the lock for its whole duration, so a write batch and a
/// poll refresh never interleave and two simulations never overlap.
#[derive(Debug)]
pub struct SharedAccelerator<S: Simulator = LinearTracker> {
    inner: Arc<Mutex<VirtualAccelerator<S>>>,
}

impl<S: Simulator> Clone for SharedAccelerator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Simulator> SharedAccelerator<S> {
    pub fn new(accelerator: VirtualAccelerator<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(accelerator)),
        }
    }

    fn lock(&self) -> EngineResult<MutexGuard<'_, VirtualAccelerator<S>>> {
        self.inner.lock().map_err(|_| EngineError::Poisoned)
    }

    pub fn set_pvs<I, K>(&self, requests: I) -> EngineResult<()>
    where
        I: IntoIterator<Item = (K, PvValue)>,
        K: AsRef<str>,
    {
        self.lock()?.set_pvs(requests)
    }

    pub fn get_pvs<I, K>(&self, names: I) -> EngineResult<PvValues>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.lock()?.get_pvs(names)
    }

    pub fn set_shutter(&self, closed: bool) -> EngineResult<()> {
        self.lock()?.set_shutter(closed)
    }

    /// One poll pass: simulate, then read `names`, under a single lock.
    pub fn refresh<I, K>(&self, names: I) -> EngineResult<PvValues>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut va = self.lock()?;
        va.refresh()?;
        va.get_pvs(names)
    }

    pub fn energy_profile(&self) -> EngineResult<EnergyProfile> {
        self.lock()?.energy_profile()
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with<R>(&self, f: impl FnOnce(&mut VirtualAccelerator<S>) -> R) -> EngineResult<R> {
        let mut va = self.lock()?;
        Ok(f(&mut va))
    }
}
