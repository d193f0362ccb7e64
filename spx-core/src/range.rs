//! Brightness based range estimation
//!
//! The sensor illuminates its field of view with infrared, so near objects
//! reflect more light. Mean frame brightness is mapped linearly onto the
//! operating range: a saturated frame means an object touching the sensor, a
//! dark frame means nothing within range.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpxError};
use crate::image::{RawImage, mean_brightness};

/// Maximum operating range of the sensor in centimetres
pub const DEFAULT_RANGE_CM: f64 = 25.0;

/// Fraction of the range under which an object counts as in range
pub const DEFAULT_IN_RANGE_FRACTION: f64 = 0.8;

/// Distance of the nearest object in centimetres, in `[0, range]`
pub type Distance = f64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeEstimator {
    range_cm: f64,
}

impl Default for RangeEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_RANGE_CM)
    }
}

impl RangeEstimator {
    pub fn new(range_cm: f64) -> Self {
        Self { range_cm }
    }

    pub fn range_cm(&self) -> f64 {
        self.range_cm
    }

    /// Estimate the distance of the nearest object from mean brightness
    pub fn estimate(&self, image: &RawImage) -> Result<Distance> {
        let mean = mean_brightness(image.pixels())?;
        Ok((1.0 - mean / 255.0) * self.range_cm)
    }
}

/// Decides whether an estimated distance is close enough to act on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangePolicy {
    pub range_cm: f64,
    pub in_range_fraction: f64,
}

impl Default for RangePolicy {
    fn default() -> Self {
        Self {
            range_cm: DEFAULT_RANGE_CM,
            in_range_fraction: DEFAULT_IN_RANGE_FRACTION,
        }
    }
}

impl RangePolicy {
    /// Distance below which an object is in range (20 cm by default)
    pub fn threshold(&self) -> Distance {
        self.in_range_fraction * self.range_cm
    }

    pub fn is_in_range(&self, distance: Distance) -> bool {
        distance < self.threshold()
    }

    /// Reject ranges that would put distances outside `[0, range_cm]`
    pub fn validate(&self) -> Result<()> {
        if !self.range_cm.is_finite() || self.range_cm <= 0.0 {
            return Err(SpxError::InvalidSettings(format!(
                "range_cm must be a positive number, got {}",
                self.range_cm
            )));
        }
        if !self.in_range_fraction.is_finite()
            || self.in_range_fraction <= 0.0
            || self.in_range_fraction > 1.0
        {
            return Err(SpxError::InvalidSettings(format!(
                "in_range_fraction must be in (0, 1], got {}",
                self.in_range_fraction
            )));
        }
        Ok(())
    }

    pub fn estimator(&self) -> RangeEstimator {
        RangeEstimator::new(self.range_cm)
    }
}
