//! Squat phase classification

use serde::{Deserialize, Serialize};
use squat_thresholds::PhaseRanges;
use std::fmt;

/// Squat depth phase, ordered from standing to full depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SquatPhase {
    #[default]
    Normal,
    Transition,
    Pass,
}

impl fmt::Display for SquatPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquatPhase::Normal => write!(f, "NORMAL"),
            SquatPhase::Transition => write!(f, "TRANSITION"),
            SquatPhase::Pass => write!(f, "PASS"),
        }
    }
}

/// Result of feeding one angle to the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseUpdate {
    pub previous: SquatPhase,
    pub current: SquatPhase,
}

impl PhaseUpdate {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Maps the knee-hip-vertical angle to a phase.
///
/// Angles in the gaps between configured ranges keep the previous phase.
pub struct PhaseClassifier {
    ranges: PhaseRanges,
    current: SquatPhase,
}

impl PhaseClassifier {
    pub fn new(ranges: PhaseRanges) -> Self {
        Self {
            ranges,
            current: SquatPhase::Normal,
        }
    }

    /// Phase whose range contains `angle`, or `None` inside a gap
    pub fn phase_for(&self, angle: f64) -> Option<SquatPhase> {
        if self.ranges.normal.contains(angle) {
            Some(SquatPhase::Normal)
        } else if self.ranges.transition.contains(angle) {
            Some(SquatPhase::Transition)
        } else if self.ranges.pass.contains(angle) {
            Some(SquatPhase::Pass)
        } else {
            None
        }
    }

    /// Classify one frame's angle and move to the resulting phase.
    /// An unmeasurable angle (`None`) leaves the phase unchanged.
    pub fn update(&mut self, angle: Option<f64>) -> PhaseUpdate {
        let previous = self.current;
        if let Some(phase) = angle.and_then(|a| self.phase_for(a)) {
            self.current = phase;
        }
        PhaseUpdate {
            previous,
            current: self.current,
        }
    }

    /// Current phase
    pub fn current(&self) -> SquatPhase {
        self.current
    }

    /// Override the phase (inactivity reset)
    pub fn force(&mut self, phase: SquatPhase) {
        self.current = phase;
    }
}
