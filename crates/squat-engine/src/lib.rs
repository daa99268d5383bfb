//! Squat Analysis Engine
//!
//! Turns a stream of body landmark frames into squat repetitions:
//! - Phase classification with hysteresis (NORMAL / TRANSITION / PASS)
//! - Form checks with multi-frame persistence
//! - Rep counting via an explicit state machine
//! - Inactivity reset of abandoned reps

mod inactivity;
mod phase;
mod posture;
mod rep;
mod session;

pub use inactivity::InactivityMonitor;
pub use phase::{PhaseClassifier, PhaseUpdate, SquatPhase};
pub use posture::{Feedback, PostureReport, PostureValidator, ViolationKind, ViolationSet};
pub use rep::{
    quality_score, DiscardReason, Rep, RepEvent, RepFrame, RepMachine, RepState,
    ShallowRepPolicy, DEPTH_PENALTY, VIOLATION_PENALTY,
};
pub use session::{FrameAnalysis, SessionOutcome, SquatSession};
