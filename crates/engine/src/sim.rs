//! Nutrient-water sensor simulator.
//!
//! Models the three probes of the tower:
//! - pH as a bounded random walk around the previous value
//! - Conductivity held constant (no dosing is simulated)
//! - Temperature resampled around a fixed baseline every tick
//!
//! The random source sits behind [`NoiseSource`] so tests can script it.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// One snapshot of the water probes.  Replaced wholesale each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub ph: f64,
    /// Conductivity in mS/cm.
    pub ec: f64,
    /// Water temperature in °C.
    pub temp: f64,
}

impl Default for SensorReading {
    fn default() -> Self {
        Self {
            ph: 5.8,
            ec: 1.2,
            temp: 24.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Random source
// ---------------------------------------------------------------------------

/// Uniform sample in `[lo, hi)`.
pub trait NoiseSource: Send + Sync {
    fn sample(&mut self, lo: f64, hi: f64) -> f64;
}

/// Production source backed by `fastrand`.
pub struct FastrandNoise {
    rng: fastrand::Rng,
}

impl FastrandNoise {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Default for FastrandNoise {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseSource for FastrandNoise {
    fn sample(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.rng.f64() * (hi - lo)
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Amplitudes of the per-tick perturbation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// pH moves by at most this much per tick, either direction.
    pub ph_jitter: f64,
    pub temp_baseline: f64,
    /// Temperature lands in `[temp_baseline, temp_baseline + temp_jitter)`.
    pub temp_jitter: f64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            ph_jitter: 0.05,
            temp_baseline: 24.0,
            temp_jitter: 1.0,
        }
    }
}

pub struct SensorSimulator {
    params: SimParams,
    noise: Box<dyn NoiseSource>,
}

impl SensorSimulator {
    pub fn new(params: SimParams, noise: Box<dyn NoiseSource>) -> Self {
        Self { params, noise }
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Produce the reading that follows `previous`.
    ///
    /// While `paused` the reading is frozen and returned as-is; the caller
    /// keeps ticking either way.
    pub fn advance(&mut self, previous: &SensorReading, paused: bool) -> SensorReading {
        if paused {
            return *previous;
        }

        let jitter = self.params.ph_jitter;
        let ph_offset = self.noise.sample(-jitter, jitter);
        let temp_offset = self.noise.sample(0.0, self.params.temp_jitter);

        SensorReading {
            ph: round1(previous.ph + ph_offset),
            ec: previous.ec,
            temp: round1(self.params.temp_baseline + temp_offset),
        }
    }
}

/// Round to one decimal place.
pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// ===========================================================================
// Tests
// ===========================================================================
