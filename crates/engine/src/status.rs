//! Threshold checks that turn a reading into per-metric status lights.

use serde::{Deserialize, Serialize};

use crate::catalog::CropProfile;
use crate::sim::SensorReading;

/// Absorbs binary representation error so a deviation of exactly the
/// tolerance (e.g. 6.0 vs 5.8) stays nominal.
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Nominal,
    AttentionNeeded,
}

impl Status {
    fn flag(attention: bool) -> Self {
        if attention {
            Self::AttentionNeeded
        } else {
            Self::Nominal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub ph: Status,
    pub ec: Status,
    pub temp: Status,
}

impl Evaluation {
    pub fn needs_attention(&self) -> bool {
        [self.ph, self.ec, self.temp].contains(&Status::AttentionNeeded)
    }
}

/// Allowed deviation from the crop's targets.
///
/// Conductivity and temperature are unchecked unless configured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub ph_tolerance: f64,
    pub ec_tolerance: Option<f64>,
    /// Inclusive `(min, max)` water temperature band.
    pub temp_range: Option<(f64, f64)>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            ph_tolerance: 0.2,
            ec_tolerance: None,
            temp_range: None,
        }
    }
}

fn exceeds(value: f64, target: f64, tolerance: f64) -> bool {
    (value - target).abs() > tolerance + EPSILON
}

/// Classify each metric of `reading` against `crop`'s targets.
pub fn evaluate(reading: &SensorReading, crop: &CropProfile, thresholds: &Thresholds) -> Evaluation {
    let ph = exceeds(reading.ph, crop.target_ph, thresholds.ph_tolerance);

    let ec = thresholds
        .ec_tolerance
        .is_some_and(|tol| exceeds(reading.ec, crop.target_ec, tol));

    let temp = thresholds
        .temp_range
        .is_some_and(|(min, max)| reading.temp < min - EPSILON || reading.temp > max + EPSILON);

    Evaluation {
        ph: Status::flag(ph),
        ec: Status::flag(ec),
        temp: Status::flag(temp),
    }
}
