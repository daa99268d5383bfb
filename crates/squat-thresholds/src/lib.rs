//! Squat Thresholds
//!
//! Angle thresholds that drive phase classification and form checks,
//! with the built-in difficulty presets and range validation.

mod presets;
mod range;
mod thresholds;

pub use presets::{Difficulty, PresetBook, PresetLoader};
pub use range::AngleRange;
pub use thresholds::{DepthCues, PhaseRanges, ThresholdConfig, Thresholds};

use thiserror::Error;

/// Threshold configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} range is inverted: [{low}, {high}]")]
    InvertedRange {
        field: &'static str,
        low: f64,
        high: f64,
    },

    #[error("{field} value {value} is outside [0, 180] degrees")]
    OutOfDomain { field: &'static str, value: f64 },

    #[error("{lower} range (ends at {lower_high}) overlaps {upper} range (starts at {upper_low})")]
    OverlappingPhases {
        lower: &'static str,
        upper: &'static str,
        lower_high: f64,
        upper_low: f64,
    },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("Unknown difficulty preset: {0}")]
    UnknownPreset(String),

    #[error("Failed to load thresholds: {0}")]
    Load(#[from] config::ConfigError),
}
