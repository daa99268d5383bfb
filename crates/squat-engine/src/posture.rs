//! Form checks with multi-frame persistence
//!
//! A violation fires when its angle crosses the configured bound while the
//! user is squatting (TRANSITION or PASS). It then stays active for
//! `persistence_frames` frames, counting down once per frame and re-arming
//! whenever the condition holds again.

use crate::SquatPhase;
use pose_landmarks::AngleSet;
use serde::{Deserialize, Serialize};
use squat_thresholds::{AngleRange, Thresholds};

/// Form violation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Torso lean outside the acceptable range
    HipAngle,
    /// Knee travelling past the toes
    AnkleAngle,
    /// Body not side-on to the camera
    AlignmentOffset,
    /// Squatting below the configured depth limit
    ExcessiveDepth,
}

impl ViolationKind {
    pub const ALL: [ViolationKind; 4] = [
        ViolationKind::HipAngle,
        ViolationKind::AnkleAngle,
        ViolationKind::AlignmentOffset,
        ViolationKind::ExcessiveDepth,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// One flag per violation kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationSet {
    pub hip_angle: bool,
    pub ankle_angle: bool,
    pub alignment_offset: bool,
    pub excessive_depth: bool,
}

impl ViolationSet {
    pub fn contains(&self, kind: ViolationKind) -> bool {
        match kind {
            ViolationKind::HipAngle => self.hip_angle,
            ViolationKind::AnkleAngle => self.ankle_angle,
            ViolationKind::AlignmentOffset => self.alignment_offset,
            ViolationKind::ExcessiveDepth => self.excessive_depth,
        }
    }

    pub fn insert(&mut self, kind: ViolationKind) {
        let flag = match kind {
            ViolationKind::HipAngle => &mut self.hip_angle,
            ViolationKind::AnkleAngle => &mut self.ankle_angle,
            ViolationKind::AlignmentOffset => &mut self.alignment_offset,
            ViolationKind::ExcessiveDepth => &mut self.excessive_depth,
        };
        *flag = true;
    }

    /// Add every flag set in `other`
    pub fn merge(&mut self, other: &ViolationSet) {
        for kind in other.kinds() {
            self.insert(kind);
        }
    }

    /// Kinds whose flag is set
    pub fn kinds(&self) -> impl Iterator<Item = ViolationKind> + '_ {
        ViolationKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }

    pub fn any(&self) -> bool {
        self.count() > 0
    }

    pub fn count(&self) -> usize {
        self.kinds().count()
    }
}

/// User-facing form feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    BendForward,
    BendBackward,
    LowerHips,
    KneeOverToe,
    TooDeep,
    CameraMisaligned,
}

impl Feedback {
    /// Display text for frame annotation
    pub fn message(self) -> &'static str {
        match self {
            Feedback::BendForward => "Bend forward",
            Feedback::BendBackward => "Bend backwards",
            Feedback::LowerHips => "Lower your hips",
            Feedback::KneeOverToe => "Knee falling over toe",
            Feedback::TooDeep => "Squat too deep",
            Feedback::CameraMisaligned => "Camera not aligned",
        }
    }
}

/// Output of one validation step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostureReport {
    /// Violations currently held active (includes persistence)
    pub active: ViolationSet,
    /// Violations whose condition held on this very frame
    pub triggered: ViolationSet,
    /// Feedback to display, in violation order
    pub feedback: Vec<Feedback>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lean {
    Forward,
    Backward,
}

/// Posture validator with per-kind persistence countdowns
pub struct PostureValidator {
    hip_range: AngleRange,
    ankle_max: f64,
    offset_max: f64,
    lower_hips: AngleRange,
    too_deep: f64,
    persistence: u32,
    countdowns: [u32; 4],
    lower_hips_countdown: u32,
    lean: Lean,
}

impl PostureValidator {
    pub fn new(thresholds: &Thresholds) -> Self {
        Self {
            hip_range: thresholds.hip_range,
            ankle_max: thresholds.ankle_max,
            offset_max: thresholds.offset_max,
            lower_hips: thresholds.depth_cues.lower_hips,
            too_deep: thresholds.depth_cues.too_deep,
            persistence: thresholds.persistence_frames,
            countdowns: [0; 4],
            lower_hips_countdown: 0,
            lean: Lean::Forward,
        }
    }

    /// Evaluate one valid frame.
    ///
    /// `descending` tells whether the current rep has not yet reached full
    /// depth; the "lower your hips" cue only applies then and is dropped
    /// once PASS is reached. A kind whose angle is unmeasurable on this
    /// frame cannot fire but still counts down.
    pub fn evaluate(&mut self, angles: &AngleSet, phase: SquatPhase, descending: bool) -> PostureReport {
        let squatting = phase != SquatPhase::Normal;
        let mut triggered = ViolationSet::default();

        let hip = angles.hip_vertical.map(|a| {
            let out = squatting && !self.hip_range.contains(a);
            if out {
                self.lean = if a < self.hip_range.low {
                    Lean::Forward
                } else {
                    Lean::Backward
                };
            }
            out
        });
        let conditions = [
            (ViolationKind::HipAngle, hip),
            (
                ViolationKind::AnkleAngle,
                angles.ankle_vertical.map(|a| squatting && a > self.ankle_max),
            ),
            (
                ViolationKind::AlignmentOffset,
                angles.offset.map(|a| squatting && a > self.offset_max),
            ),
            (
                ViolationKind::ExcessiveDepth,
                angles.knee_vertical.map(|a| squatting && a > self.too_deep),
            ),
        ];

        for (kind, condition) in conditions {
            let countdown = &mut self.countdowns[kind.index()];
            match condition {
                Some(true) => {
                    *countdown = self.persistence;
                    triggered.insert(kind);
                }
                Some(false) | None => *countdown = countdown.saturating_sub(1),
            }
        }

        if phase == SquatPhase::Pass {
            self.lower_hips_countdown = 0;
        } else if let Some(knee) = angles.knee_vertical {
            let cue = phase == SquatPhase::Transition && descending && self.lower_hips.contains(knee);
            self.lower_hips_countdown = if cue {
                self.persistence
            } else {
                self.lower_hips_countdown.saturating_sub(1)
            };
        }

        let mut report = self.snapshot();
        report.triggered = triggered;
        report
    }

    /// Current state without advancing any countdown (used for invalid frames)
    pub fn snapshot(&self) -> PostureReport {
        let mut active = ViolationSet::default();
        for kind in ViolationKind::ALL {
            if self.countdowns[kind.index()] > 0 {
                active.insert(kind);
            }
        }

        let mut feedback = Vec::new();
        for kind in active.kinds() {
            feedback.push(match kind {
                ViolationKind::HipAngle => match self.lean {
                    Lean::Forward => Feedback::BendForward,
                    Lean::Backward => Feedback::BendBackward,
                },
                ViolationKind::AnkleAngle => Feedback::KneeOverToe,
                ViolationKind::AlignmentOffset => Feedback::CameraMisaligned,
                ViolationKind::ExcessiveDepth => Feedback::TooDeep,
            });
        }
        if self.lower_hips_countdown > 0 {
            feedback.push(Feedback::LowerHips);
        }

        PostureReport {
            active,
            triggered: ViolationSet::default(),
            feedback,
        }
    }

    /// Drop all pending warnings
    pub fn clear(&mut self) {
        self.countdowns = [0; 4];
        self.lower_hips_countdown = 0;
    }
}
