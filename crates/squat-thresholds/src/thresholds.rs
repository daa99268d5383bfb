//! Threshold configuration and validation

use crate::range::check_degrees;
use crate::{AngleRange, ConfigError};
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::time::Duration;
use tracing::debug;

/// Knee-hip-vertical angle ranges for each squat phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseRanges {
    /// Standing
    pub normal: AngleRange,
    /// Between standing and full depth
    pub transition: AngleRange,
    /// Full depth
    pub pass: AngleRange,
}

/// Advisory depth cues on the knee-hip-vertical angle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthCues {
    /// Band where the user is told to lower their hips while descending
    pub lower_hips: AngleRange,
    /// Above this the squat is too deep
    pub too_deep: f64,
}

/// Squat threshold configuration (one difficulty tier)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Phase ranges
    pub phases: PhaseRanges,

    /// Acceptable torso lean from vertical (degrees)
    pub hip_range: AngleRange,

    /// Maximum shank lean from vertical (degrees)
    pub ankle_max: f64,

    /// Depth cues
    pub depth_cues: DepthCues,

    /// Maximum nose/shoulder offset angle before the camera counts as misaligned
    pub offset_max: f64,

    /// Idle time without a phase change before the in-progress rep is dropped (seconds)
    pub inactivity_timeout_secs: f64,

    /// Frames a warning stays active after its condition last held
    pub persistence_frames: u32,
}

impl ThresholdConfig {
    /// Check every range invariant and freeze the configuration
    pub fn validate(self) -> Result<Thresholds, ConfigError> {
        let phases = &self.phases;
        phases.normal.check("phases.normal")?;
        phases.transition.check("phases.transition")?;
        phases.pass.check("phases.pass")?;

        if phases.normal.high >= phases.transition.low {
            return Err(ConfigError::OverlappingPhases {
                lower: "normal",
                upper: "transition",
                lower_high: phases.normal.high,
                upper_low: phases.transition.low,
            });
        }
        if phases.transition.high >= phases.pass.low {
            return Err(ConfigError::OverlappingPhases {
                lower: "transition",
                upper: "pass",
                lower_high: phases.transition.high,
                upper_low: phases.pass.low,
            });
        }

        self.hip_range.check("hip_range")?;
        check_degrees("ankle_max", self.ankle_max)?;
        check_degrees("offset_max", self.offset_max)?;

        self.depth_cues.lower_hips.check("depth_cues.lower_hips")?;
        check_degrees("depth_cues.too_deep", self.depth_cues.too_deep)?;
        if self.depth_cues.lower_hips.high > self.depth_cues.too_deep {
            return Err(ConfigError::InvertedRange {
                field: "depth_cues",
                low: self.depth_cues.lower_hips.high,
                high: self.depth_cues.too_deep,
            });
        }

        if !(self.inactivity_timeout_secs > 0.0 && self.inactivity_timeout_secs.is_finite()) {
            return Err(ConfigError::NonPositive {
                field: "inactivity_timeout_secs",
                value: self.inactivity_timeout_secs,
            });
        }
        if self.persistence_frames == 0 {
            return Err(ConfigError::NonPositive {
                field: "persistence_frames",
                value: 0.0,
            });
        }

        debug!("Threshold configuration validated: {:?}", self);
        Ok(Thresholds(self))
    }
}

/// Validated, read-only thresholds; the only form the engine accepts
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds(ThresholdConfig);

impl Thresholds {
    /// Inactivity timeout as a duration
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.0.inactivity_timeout_secs)
    }
}

impl Deref for Thresholds {
    type Target = ThresholdConfig;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
