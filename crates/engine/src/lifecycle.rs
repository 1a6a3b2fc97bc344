//! Crop lifecycle: which crop is growing and how far along it is.

use serde::Serialize;
use std::sync::Arc;

use crate::catalog::CropProfile;

/// Active crop plus the current day of its cycle.
///
/// `day` always lies in `1..=crop.days_to_harvest`.  The catalog guarantees
/// `days_to_harvest >= 1`, so progress never divides by zero.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleState {
    crop: Arc<CropProfile>,
    day: u32,
}

/// Presentation copy of [`LifecycleState`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleView {
    pub crop_id: String,
    pub crop_name: String,
    pub icon: String,
    pub target_ph: f64,
    pub target_ec: f64,
    pub day: u32,
    pub days_to_harvest: u32,
    pub progress: f64,
    pub harvest_ready: bool,
}

impl LifecycleState {
    /// Start a fresh cycle for `crop` at day 1.
    pub fn select(crop: Arc<CropProfile>) -> Self {
        Self { crop, day: 1 }
    }

    /// Start mid-cycle, e.g. the demo seed at process start.  `day` is
    /// clamped into the valid range.
    pub fn seeded(crop: Arc<CropProfile>, day: u32) -> Self {
        let day = day.clamp(1, crop.days_to_harvest.max(1));
        Self { crop, day }
    }

    pub fn crop(&self) -> &Arc<CropProfile> {
        &self.crop
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Fraction of the cycle completed, `day / days_to_harvest`.
    pub fn harvest_progress(&self) -> f64 {
        f64::from(self.day) / f64::from(self.crop.days_to_harvest.max(1))
    }

    pub fn is_harvest_ready(&self) -> bool {
        self.day >= self.crop.days_to_harvest
    }

    /// Move one day forward, stopping at harvest.  Returns whether the day
    /// counter changed.
    pub fn advance_day(&mut self) -> bool {
        if self.is_harvest_ready() {
            return false;
        }
        self.day += 1;
        true
    }

    pub fn view(&self) -> LifecycleView {
        LifecycleView {
            crop_id: self.crop.id.clone(),
            crop_name: self.crop.name.clone(),
            icon: self.crop.icon.clone(),
            target_ph: self.crop.target_ph,
            target_ec: self.crop.target_ec,
            day: self.day,
            days_to_harvest: self.crop.days_to_harvest,
            progress: self.harvest_progress(),
            harvest_ready: self.is_harvest_ready(),
        }
    }
}
