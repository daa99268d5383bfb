//! Workout Summary
//!
//! Pure reduction of completed reps into workout-level statistics.

mod statistics;
mod summary;

pub use statistics::{Dispersion, CONSISTENCY_SCALE_DEG};
pub use summary::WorkoutSummary;
