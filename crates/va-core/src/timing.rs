//! Lightweight performance timing utilities.
//!
//! Tracking passes are the only latency source in the engine, so this
//! module lets callers see how much time goes into them. Disabled unless
//! `VA_TIMING` is set or [`enable_timing`] is called.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable performance timing globally.
pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

/// Disable performance timing globally.
pub fn disable_timing() {
    ENABLED.store(false, Ordering::Relaxed);
}

/// Check if timing is enabled.
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var("VA_TIMING").is_ok()
}

/// A simple timer that measures elapsed time.
pub struct Timer {
    start: Instant,
    enabled: bool,
}

impl Timer {
    /// Create and start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            enabled: is_enabled(),
        }
    }

    /// Stop the timer and return elapsed time in seconds.
    /// If timing is disabled, returns None.
    pub fn stop(self) -> Option<f64> {
        if self.enabled {
            Some(self.start.elapsed().as_secs_f64())
        } else {
            None
        }
    }

    /// Stop the timer and add the elapsed time to `acc` if timing is enabled.
    pub fn stop_into(self, acc: &AccumulatingTimer) {
        if let Some(elapsed) = self.stop() {
            acc.record(elapsed);
        }
    }
}

/// Accumulating timer for tracking total time across multiple calls.
pub struct AccumulatingTimer {
    total_ns: AtomicU64,
    count: AtomicU64,
}

impl Default for AccumulatingTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl AccumulatingTimer {
    pub const fn new() -> Self {
        Self {
            total_ns: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Record a timing measurement.
    pub fn record(&self, duration_s: f64) {
        let nanos = (duration_s * 1e9) as u64;
        self.total_ns.fetch_add(nanos, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Total time spent (in seconds).
    pub fn total_seconds(&self) -> f64 {
        self.total_ns.load(Ordering::Relaxed) as f64 / 1e9
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Average time per call (in seconds).
    pub fn average_seconds(&self) -> f64 {
        let count = self.count();
        if count > 0 {
            self.total_seconds() / count as f64
        } else {
            0.0
        }
    }

    pub fn reset(&self) {
        self.total_ns.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }
}

/// Simulation timers.
pub mod sim_timing {
    use super::AccumulatingTimer;

    /// Full tracking passes (readings refreshed).
    pub static TRACK_CALLS: AccumulatingTimer = AccumulatingTimer::new();
    /// Zero-charge energy probes.
    pub static ENERGY_PROBE_CALLS: AccumulatingTimer = AccumulatingTimer::new();

    pub fn reset_all() {
        TRACK_CALLS.reset();
        ENERGY_PROBE_CALLS.reset();
    }

    /// One-line summary, or `None` when timing is disabled.
    pub fn summary() -> Option<String> {
        if !super::is_enabled() {
            return None;
        }
        Some(format!(
            "track: {} calls, {:.4}ms avg; energy probe: {} calls, {:.4}ms avg",
            TRACK_CALLS.count(),
            TRACK_CALLS.average_seconds() * 1000.0,
            ENERGY_PROBE_CALLS.count(),
            ENERGY_PROBE_CALLS.average_seconds() * 1000.0,
        ))
    }
}
