//! Inclusive angle ranges

use crate::ConfigError;
use serde::{Deserialize, Serialize};

/// Inclusive range of angles in degrees, written as `[low, high]` in config files
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct AngleRange {
    pub low: f64,
    pub high: f64,
}

impl AngleRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Whether `angle` lies within the range (bounds included)
    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.low && angle <= self.high
    }

    pub(crate) fn check(&self, field: &'static str) -> Result<(), ConfigError> {
        check_degrees(field, self.low)?;
        check_degrees(field, self.high)?;
        if self.low > self.high {
            return Err(ConfigError::InvertedRange {
                field,
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }
}

impl From<(f64, f64)> for AngleRange {
    fn from((low, high): (f64, f64)) -> Self {
        Self { low, high }
    }
}

impl From<AngleRange> for (f64, f64) {
    fn from(range: AngleRange) -> Self {
        (range.low, range.high)
    }
}

/// Reject angles outside [0, 180] (NaN included)
pub(crate) fn check_degrees(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=180.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfDomain { field, value })
    }
}
