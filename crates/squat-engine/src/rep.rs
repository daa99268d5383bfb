//! Repetition state machine

use crate::{SquatPhase, ViolationSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Quality lost per distinct violation kind active during a rep
pub const VIOLATION_PENALTY: f64 = 20.0;

/// Quality lost when a rep never reaches full depth
pub const DEPTH_PENALTY: f64 = 30.0;

/// Quality score in [0, 100] for a finished rep
pub fn quality_score(violations: &ViolationSet, deepest: SquatPhase) -> f64 {
    let mut score = 100.0 - VIOLATION_PENALTY * violations.count() as f64;
    if deepest < SquatPhase::Pass {
        score -= DEPTH_PENALTY;
    }
    score.clamp(0.0, 100.0)
}

/// Completed repetition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rep {
    pub start_frame: u64,
    pub end_frame: u64,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Deepest phase reached
    pub deepest_phase: SquatPhase,
    /// Whether any violation was active during the rep
    pub improper: bool,
    /// Violation kinds active at some frame of the rep
    pub violations: ViolationSet,
    /// Largest knee-hip-vertical angle reached (degrees)
    pub peak_knee_angle: f64,
    /// Torso angle at the deepest point, when it was measurable
    pub hip_angle_at_peak: Option<f64>,
    /// Quality score (0-100)
    pub quality: f64,
}

/// Why an in-progress rep was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    /// Returned to standing without reaching full depth
    Shallow,
    /// No phase change within the inactivity timeout
    Inactivity,
    /// Stream ended mid-rep
    EndOfStream,
}

/// Rep lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RepEvent {
    Started { frame: u64 },
    ReachedBottom { frame: u64 },
    Completed(Rep),
    Discarded { start_frame: u64, reason: DiscardReason },
}

/// What to do with excursions that reach TRANSITION but never PASS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShallowRepPolicy {
    /// Drop them and only tally the attempt
    #[default]
    Discard,
    /// Count them as improper reps with the depth penalty
    CountImproper,
}

/// Machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepState {
    /// Standing, no rep in progress
    #[default]
    Idle,
    /// In TRANSITION on the way down
    Descending,
    /// At full depth
    Bottom,
    /// In TRANSITION on the way up
    Ascending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Hold,
    Start,
    MarkBottom,
    Finish,
}

/// Transition table over (state, phase) pairs
fn transition(state: RepState, phase: SquatPhase) -> (RepState, Action) {
    use RepState::*;
    use SquatPhase::*;

    match (state, phase) {
        (Idle, Normal) => (Idle, Action::Hold),
        (Idle, Transition) => (Descending, Action::Start),
        (Idle, Pass) => (Bottom, Action::Start),

        (Descending, Normal) => (Idle, Action::Finish),
        (Descending, Transition) => (Descending, Action::Hold),
        (Descending, Pass) => (Bottom, Action::MarkBottom),

        (Bottom, Normal) => (Idle, Action::Finish),
        (Bottom, Transition) => (Ascending, Action::Hold),
        (Bottom, Pass) => (Bottom, Action::Hold),

        (Ascending, Normal) => (Idle, Action::Finish),
        (Ascending, Transition) => (Ascending, Action::Hold),
        (Ascending, Pass) => (Bottom, Action::Hold),
    }
}

/// Measurements of one valid frame handed to the machine
#[derive(Debug, Clone, Copy)]
pub struct RepFrame {
    pub index: u64,
    pub timestamp_ms: u64,
    pub phase: SquatPhase,
    pub knee_angle: f64,
    pub hip_angle: Option<f64>,
    /// Violations active on this frame (persistence included)
    pub violations: ViolationSet,
}

#[derive(Debug, Clone)]
struct InProgressRep {
    start_frame: u64,
    start_ms: u64,
    deepest: SquatPhase,
    violations: ViolationSet,
    peak_knee_angle: f64,
    hip_angle_at_peak: Option<f64>,
}

impl InProgressRep {
    fn begin(frame: &RepFrame) -> Self {
        Self {
            start_frame: frame.index,
            start_ms: frame.timestamp_ms,
            deepest: frame.phase,
            violations: ViolationSet::default(),
            peak_knee_angle: frame.knee_angle,
            hip_angle_at_peak: frame.hip_angle,
        }
    }

    fn track(&mut self, frame: &RepFrame) {
        self.deepest = self.deepest.max(frame.phase);
        self.violations.merge(&frame.violations);
        if frame.knee_angle > self.peak_knee_angle {
            self.peak_knee_angle = frame.knee_angle;
            if frame.hip_angle.is_some() {
                self.hip_angle_at_peak = frame.hip_angle;
            }
        }
    }

    fn finish(self, frame: &RepFrame, force_improper: bool) -> Rep {
        Rep {
            start_frame: self.start_frame,
            end_frame: frame.index,
            start_ms: self.start_ms,
            end_ms: frame.timestamp_ms,
            deepest_phase: self.deepest,
            improper: force_improper || self.violations.any(),
            violations: self.violations,
            peak_knee_angle: self.peak_knee_angle,
            hip_angle_at_peak: self.hip_angle_at_peak,
            quality: quality_score(&self.violations, self.deepest),
        }
    }
}

/// Counts reps from phase transitions and owns the completed-rep list
pub struct RepMachine {
    state: RepState,
    current: Option<InProgressRep>,
    completed: Vec<Rep>,
    shallow_attempts: u32,
    policy: ShallowRepPolicy,
}

impl RepMachine {
    pub fn new(policy: ShallowRepPolicy) -> Self {
        Self {
            state: RepState::Idle,
            current: None,
            completed: Vec::new(),
            shallow_attempts: 0,
            policy,
        }
    }

    /// Feed one valid frame
    pub fn advance(&mut self, frame: &RepFrame) -> Option<RepEvent> {
        let (next, action) = transition(self.state, frame.phase);
        if next != self.state {
            debug!("Rep state {:?} -> {:?} at frame {}", self.state, next, frame.index);
        }
        self.state = next;

        let event = match action {
            Action::Hold => None,
            Action::Start => {
                if self.current.is_some() {
                    debug!("Rep already in progress at frame {}, continuing it", frame.index);
                    None
                } else {
                    self.current = Some(InProgressRep::begin(frame));
                    Some(RepEvent::Started { frame: frame.index })
                }
            }
            Action::MarkBottom => Some(RepEvent::ReachedBottom { frame: frame.index }),
            Action::Finish => return self.finish(frame),
        };

        if let Some(rep) = self.current.as_mut() {
            rep.track(frame);
        }
        event
    }

    fn finish(&mut self, frame: &RepFrame) -> Option<RepEvent> {
        let rep = self.current.take()?;

        if rep.deepest < SquatPhase::Pass && self.policy == ShallowRepPolicy::Discard {
            self.shallow_attempts += 1;
            debug!(
                "Shallow attempt from frame {} discarded (deepest {})",
                rep.start_frame, rep.deepest
            );
            return Some(RepEvent::Discarded {
                start_frame: rep.start_frame,
                reason: DiscardReason::Shallow,
            });
        }

        let shallow = rep.deepest < SquatPhase::Pass;
        let rep = rep.finish(frame, shallow);
        info!(
            "Rep {} completed: frames {}-{}, quality {:.0}, improper {}",
            self.completed.len() + 1,
            rep.start_frame,
            rep.end_frame,
            rep.quality,
            rep.improper
        );
        self.completed.push(rep.clone());
        Some(RepEvent::Completed(rep))
    }

    /// Drop the in-progress rep without counting it and return to idle
    pub fn abandon(&mut self, reason: DiscardReason) -> Option<RepEvent> {
        self.state = RepState::Idle;
        let rep = self.current.take()?;
        debug!("Rep from frame {} discarded: {:?}", rep.start_frame, reason);
        Some(RepEvent::Discarded {
            start_frame: rep.start_frame,
            reason,
        })
    }

    pub fn state(&self) -> RepState {
        self.state
    }

    /// Whether the current rep (if any) has yet to reach full depth
    pub fn is_descending(&self) -> bool {
        matches!(self.state, RepState::Idle | RepState::Descending)
    }

    pub fn in_progress(&self) -> bool {
        self.current.is_some()
    }

    pub fn completed(&self) -> &[Rep] {
        &self.completed
    }

    pub fn shallow_attempts(&self) -> u32 {
        self.shallow_attempts
    }

    pub fn into_completed(self) -> Vec<Rep> {
        self.completed
    }
}
