//! Per-session squat analysis
//!
//! A session owns all mutable state for one landmark stream. Frames must be
//! fed in order; a fresh session is created for every analysis run.

use crate::{
    DiscardReason, Feedback, InactivityMonitor, PhaseClassifier, PostureValidator, Rep, RepEvent,
    RepFrame, RepMachine, ShallowRepPolicy, SquatPhase, ViolationSet,
};
use pose_landmarks::{AngleSet, FrameLandmarks, MIN_VISIBILITY};
use serde::{Deserialize, Serialize};
use squat_thresholds::Thresholds;
use tracing::{debug, info, trace, warn};

/// Per-frame output for annotation and progress reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    pub frame_index: u64,
    pub timestamp_ms: u64,
    /// Whether the phase-driving angle could be measured
    pub valid: bool,
    pub angles: AngleSet,
    pub phase: SquatPhase,
    /// Violations currently held active
    pub violations: ViolationSet,
    pub feedback: Vec<Feedback>,
    /// Rep events raised on this frame
    pub events: Vec<RepEvent>,
    /// Reps completed so far
    pub total_reps: usize,
    /// Completed reps marked improper so far
    pub improper_reps: usize,
}

/// Final state of a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub reps: Vec<Rep>,
    pub shallow_attempts: u32,
    pub frames_processed: u64,
    pub invalid_frames: u64,
}

/// Squat analysis session for one landmark stream
pub struct SquatSession {
    classifier: PhaseClassifier,
    validator: PostureValidator,
    machine: RepMachine,
    inactivity: InactivityMonitor,
    frames_processed: u64,
    invalid_frames: u64,
}

impl SquatSession {
    /// Create a session that discards shallow attempts
    pub fn new(thresholds: &Thresholds) -> Self {
        Self::with_policy(thresholds, ShallowRepPolicy::default())
    }

    pub fn with_policy(thresholds: &Thresholds, policy: ShallowRepPolicy) -> Self {
        info!(
            "Starting squat session (pass range {:?}, shallow reps {:?})",
            thresholds.phases.pass, policy
        );
        Self {
            classifier: PhaseClassifier::new(thresholds.phases),
            validator: PostureValidator::new(thresholds),
            machine: RepMachine::new(policy),
            inactivity: InactivityMonitor::new(thresholds.inactivity_timeout()),
            frames_processed: 0,
            invalid_frames: 0,
        }
    }

    /// Analyse the next frame of the stream
    pub fn process(&mut self, frame: &FrameLandmarks) -> FrameAnalysis {
        let angles = AngleSet::from_frame(frame, MIN_VISIBILITY);
        self.process_angles(frame.timestamp_ms, angles)
    }

    /// Analyse the next frame from already-measured angles
    pub fn process_angles(&mut self, timestamp_ms: u64, angles: AngleSet) -> FrameAnalysis {
        let frame_index = self.frames_processed;
        self.frames_processed += 1;

        let mut events = Vec::new();
        if self.inactivity.check(timestamp_ms) {
            warn!(
                "No phase change for over {:?} at frame {}, resetting in-progress rep",
                self.inactivity.timeout(),
                frame_index
            );
            events.extend(self.machine.abandon(DiscardReason::Inactivity));
            self.classifier.force(SquatPhase::Normal);
            self.validator.clear();
        }

        let Some(knee_angle) = angles.knee_vertical else {
            self.invalid_frames += 1;
            trace!("Frame {} has no measurable knee angle, holding state", frame_index);
            let report = self.validator.snapshot();
            return self.analysis(
                frame_index,
                timestamp_ms,
                false,
                angles,
                report.active,
                report.feedback,
                events,
            );
        };

        let update = self.classifier.update(Some(knee_angle));
        if update.changed() {
            debug!(
                "Phase {} -> {} at frame {} (knee {:.1})",
                update.previous, update.current, frame_index, knee_angle
            );
            self.inactivity.record_change(timestamp_ms);
        }

        let report = self
            .validator
            .evaluate(&angles, update.current, self.machine.is_descending());

        let rep_frame = RepFrame {
            index: frame_index,
            timestamp_ms,
            phase: update.current,
            knee_angle,
            hip_angle: angles.hip_vertical,
            violations: report.active,
        };
        events.extend(self.machine.advance(&rep_frame));

        self.analysis(
            frame_index,
            timestamp_ms,
            true,
            angles,
            report.active,
            report.feedback,
            events,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn analysis(
        &self,
        frame_index: u64,
        timestamp_ms: u64,
        valid: bool,
        angles: AngleSet,
        violations: ViolationSet,
        feedback: Vec<Feedback>,
        events: Vec<RepEvent>,
    ) -> FrameAnalysis {
        let completed = self.machine.completed();
        FrameAnalysis {
            frame_index,
            timestamp_ms,
            valid,
            angles,
            phase: self.classifier.current(),
            violations,
            feedback,
            events,
            total_reps: completed.len(),
            improper_reps: completed.iter().filter(|r| r.improper).count(),
        }
    }

    /// Current phase
    pub fn phase(&self) -> SquatPhase {
        self.classifier.current()
    }

    /// Reps completed so far (queryable mid-stream)
    pub fn completed_reps(&self) -> &[Rep] {
        self.machine.completed()
    }

    /// Shallow attempts discarded so far
    pub fn shallow_attempts(&self) -> u32 {
        self.machine.shallow_attempts()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// End the stream; an unfinished rep is discarded
    pub fn finish(mut self) -> SessionOutcome {
        if self.machine.abandon(DiscardReason::EndOfStream).is_some() {
            debug!("Stream ended mid-rep, in-progress rep discarded");
        }

        let shallow_attempts = self.machine.shallow_attempts();
        let outcome = SessionOutcome {
            reps: self.machine.into_completed(),
            shallow_attempts,
            frames_processed: self.frames_processed,
            invalid_frames: self.invalid_frames,
        };
        info!(
            "Session finished: {} frames ({} invalid), {} reps, {} shallow attempts",
            outcome.frames_processed,
            outcome.invalid_frames,
            outcome.reps.len(),
            outcome.shallow_attempts
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pose_landmarks::testing::SquatPoseBuilder;
    use squat_thresholds::Difficulty;

    const FRAME_MS: u64 = 33;

    struct Stream {
        session: SquatSession,
        t: u64,
    }

    impl Stream {
        fn new(difficulty: Difficulty) -> Self {
            Self::with_policy(difficulty, ShallowRepPolicy::Discard)
        }

        fn with_policy(difficulty: Difficulty, policy: ShallowRepPolicy) -> Self {
            Self {
                session: SquatSession::with_policy(&difficulty.thresholds().unwrap(), policy),
                t: 0,
            }
        }

        fn pose(&mut self, pose: SquatPoseBuilder, frames: usize) -> Vec<FrameAnalysis> {
            (0..frames)
                .map(|_| {
                    let analysis = self.session.process(&pose.build(self.t));
                    self.t += FRAME_MS;
                    analysis
                })
                .collect()
        }

        fn knees(&mut self, knees: &[f64], frames_each: usize) -> Vec<FrameAnalysis> {
            knees
                .iter()
                .flat_map(|k| self.pose(SquatPoseBuilder::new().knee(*k), frames_each))
                .collect()
        }

        fn events(analyses: &[FrameAnalysis]) -> Vec<RepEvent> {
            analyses.iter().flat_map(|a| a.events.clone()).collect()
        }
    }

    #[test]
    fn test_single_clean_rep() {
        let mut s = Stream::new(Difficulty::Lenient);
        let frames = s.knees(&[10.0, 50.0, 85.0, 50.0, 10.0], 5);

        let phases: Vec<_> = frames.iter().map(|f| f.phase).collect();
        assert_eq!(phases[4], SquatPhase::Normal);
        assert_eq!(phases[5], SquatPhase::Transition);
        assert_eq!(phases[10], SquatPhase::Pass);
        assert_eq!(phases[15], SquatPhase::Transition);
        assert_eq!(phases[20], SquatPhase::Normal);

        let last = frames.last().unwrap();
        assert_eq!(last.total_reps, 1);
        assert_eq!(last.improper_reps, 0);

        let outcome = s.session.finish();
        assert_eq!(outcome.reps.len(), 1);
        assert_eq!(outcome.reps[0].quality, 100.0);
        assert_eq!(outcome.reps[0].start_frame, 5);
        assert_eq!(outcome.reps[0].end_frame, 20);
        assert!((outcome.reps[0].peak_knee_angle - 85.0).abs() < 1e-6);
    }

    #[test]
    fn test_transition_only_is_not_a_rep() {
        let mut s = Stream::new(Difficulty::Lenient);
        let frames = s.knees(&[10.0, 40.0, 10.0], 5);

        assert_eq!(frames.last().unwrap().total_reps, 0);
        assert!(Stream::events(&frames).contains(&RepEvent::Discarded {
            start_frame: 5,
            reason: DiscardReason::Shallow
        }));
        assert_eq!(s.session.shallow_attempts(), 1);
    }

    #[test]
    fn test_never_leaving_normal_is_silent() {
        let mut s = Stream::new(Difficulty::Lenient);
        let frames = s.knees(&[10.0, 25.0, 10.0], 5);

        assert!(Stream::events(&frames).is_empty());
        assert_eq!(s.session.shallow_attempts(), 0);
        assert_eq!(frames.last().unwrap().total_reps, 0);
    }

    #[test]
    fn test_shallow_counted_when_configured() {
        let mut s = Stream::with_policy(Difficulty::Lenient, ShallowRepPolicy::CountImproper);
        let frames = s.knees(&[10.0, 40.0, 10.0], 5);

        let last = frames.last().unwrap();
        assert_eq!(last.total_reps, 1);
        assert_eq!(last.improper_reps, 1);
    }

    #[test]
    fn test_strict_tier_needs_deeper_squat() {
        // 75 degrees is PASS for the lenient tier but a gap for the strict one
        let mut lenient = Stream::new(Difficulty::Lenient);
        let frames = lenient.knees(&[10.0, 50.0, 75.0, 50.0, 10.0], 3);
        assert_eq!(frames.last().unwrap().total_reps, 1);

        let mut strict = Stream::new(Difficulty::Strict);
        let frames = strict.knees(&[10.0, 50.0, 75.0, 50.0, 10.0], 3);
        assert_eq!(frames.last().unwrap().total_reps, 0);
    }

    #[test]
    fn test_violation_at_bottom_marks_improper() {
        let mut s = Stream::new(Difficulty::Lenient);
        s.knees(&[10.0, 50.0], 3);
        let bottom = s.pose(SquatPoseBuilder::new().knee(85.0).ankle(50.0), 1);
        assert!(bottom[0].violations.ankle_angle);
        assert_eq!(bottom[0].feedback, vec![Feedback::KneeOverToe]);

        let frames = s.knees(&[85.0, 50.0, 10.0], 3);
        let last = frames.last().unwrap();
        assert_eq!(last.total_reps, 1);
        assert_eq!(last.improper_reps, 1);

        let rep = &s.session.completed_reps()[0];
        assert!(rep.violations.ankle_angle);
        assert!(rep.quality < 100.0);
    }

    #[test]
    fn test_persisting_warning_charged_to_next_rep() {
        let mut s = Stream::new(Difficulty::Lenient);
        s.knees(&[10.0, 50.0], 2);
        s.pose(SquatPoseBuilder::new().knee(85.0).hip(60.0), 1);
        s.knees(&[50.0, 10.0], 2);

        // Next rep starts while the hip warning is still counting down
        let frames = s.knees(&[50.0, 85.0, 50.0, 10.0], 2);
        assert!(frames[0].violations.hip_angle);

        let reps = s.session.completed_reps();
        assert_eq!(reps.len(), 2);
        assert!(reps[0].improper);
        assert!(reps[1].improper);
        assert!(reps[1].violations.hip_angle);
        assert_eq!(reps[1].quality, 100.0 - crate::VIOLATION_PENALTY);
    }

    #[test]
    fn test_expired_warning_not_charged_to_next_rep() {
        let mut s = Stream::new(Difficulty::Lenient);
        s.knees(&[10.0, 50.0], 2);
        s.pose(SquatPoseBuilder::new().knee(85.0).hip(60.0), 1);
        s.knees(&[50.0], 2);
        // Stand long enough for the countdown to run out
        s.knees(&[10.0], 60);

        let frames = s.knees(&[50.0, 85.0, 50.0, 10.0], 2);
        assert!(!frames[0].violations.any());

        let reps = s.session.completed_reps();
        assert_eq!(reps.len(), 2);
        assert!(!reps[1].improper);
        assert_eq!(reps[1].quality, 100.0);
    }

    #[test]
    fn test_invalid_frames_hold_state() {
        let mut s = Stream::new(Difficulty::Lenient);
        s.knees(&[10.0, 50.0, 85.0], 3);

        let hidden = s.pose(SquatPoseBuilder::new().knee(10.0).visibility(0.2), 10);
        for frame in &hidden {
            assert!(!frame.valid);
            assert_eq!(frame.phase, SquatPhase::Pass);
            assert!(frame.events.is_empty());
        }

        let frames = s.knees(&[50.0, 10.0], 3);
        assert_eq!(frames.last().unwrap().total_reps, 1);
        assert_eq!(s.session.finish().invalid_frames, 10);
    }

    #[test]
    fn test_hysteresis_gap_holds_phase() {
        let mut s = Stream::new(Difficulty::Lenient);
        s.knees(&[10.0, 50.0], 3);
        let frames = s.knees(&[66.0, 69.0, 67.5, 68.0, 69.5, 66.5], 4);
        assert!(frames.iter().all(|f| f.phase == SquatPhase::Transition));
        assert!(Stream::events(&frames).is_empty());
    }

    #[test]
    fn test_inactivity_discards_in_progress_rep() {
        let mut s = Stream::new(Difficulty::Lenient);
        let frames = s.knees(&[10.0, 50.0, 85.0, 50.0, 10.0], 3);
        assert_eq!(frames.last().unwrap().total_reps, 1);

        // Hold TRANSITION for well over 15 seconds
        s.knees(&[50.0], 1);
        let held = s.knees(&[50.0], 600);
        let discarded = Stream::events(&held)
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    RepEvent::Discarded {
                        reason: DiscardReason::Inactivity,
                        ..
                    }
                )
            })
            .count();
        assert!(discarded >= 1);
        assert!(held.iter().all(|f| f.total_reps == 1));

        // Counting resumes normally afterwards
        let frames = s.knees(&[85.0, 50.0, 10.0], 3);
        assert_eq!(frames.last().unwrap().total_reps, 2);
    }

    #[test]
    fn test_empty_session() {
        let s = Stream::new(Difficulty::Lenient);
        let outcome = s.session.finish();
        assert!(outcome.reps.is_empty());
        assert_eq!(outcome.frames_processed, 0);
    }

    #[test]
    fn test_unfinished_rep_dropped_at_end() {
        let mut s = Stream::new(Difficulty::Lenient);
        s.knees(&[10.0, 50.0, 85.0], 3);
        assert!(s.session.finish().reps.is_empty());
    }

    #[test]
    fn test_frame_analysis_serializes() {
        let mut s = Stream::new(Difficulty::Lenient);
        let frames = s.knees(&[10.0, 50.0], 1);
        let json = serde_json::to_value(&frames[1]).unwrap();
        assert_eq!(json["phase"], "TRANSITION");
        assert_eq!(json["events"][0]["event"], "started");
    }
}
