//! Workout summary record

use crate::Dispersion;
use serde::{Deserialize, Serialize};
use squat_engine::Rep;
use tracing::debug;

/// Workout-level statistics.
///
/// Serializes as a flat object with exactly these six keys; downstream
/// persistence and reporting read this shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSummary {
    pub total_reps: usize,
    pub improper_reps: usize,
    /// Mean rep quality (percent)
    pub average_quality: f64,
    /// Highest rep quality (percent)
    pub best_rep_quality: f64,
    /// Consistency of the deepest knee angle across reps
    pub depth_consistency: f64,
    /// Consistency of the torso angle at the deepest point across reps
    pub back_angle_consistency: f64,
}

impl WorkoutSummary {
    /// Reduce completed reps to a summary. An empty list yields all zeros.
    pub fn from_reps(reps: &[Rep]) -> Self {
        if reps.is_empty() {
            return Self::default();
        }

        let qualities: Vec<f64> = reps.iter().map(|r| r.quality).collect();
        let depths: Vec<f64> = reps.iter().map(|r| r.peak_knee_angle).collect();
        let back_angles: Vec<f64> = reps.iter().filter_map(|r| r.hip_angle_at_peak).collect();

        let quality = Dispersion::compute(&qualities);
        let depth = Dispersion::compute(&depths);
        let back = Dispersion::compute(&back_angles);
        debug!(
            "Depth spread {:.1} deg over {} reps, back spread {:.1} deg over {} reps",
            depth.std_dev, depth.count, back.std_dev, back.count
        );

        Self {
            total_reps: reps.len(),
            improper_reps: reps.iter().filter(|r| r.improper).count(),
            average_quality: quality.mean,
            best_rep_quality: quality.max,
            depth_consistency: depth.consistency_score(),
            back_angle_consistency: back.consistency_score(),
        }
    }

    /// Share of reps with proper form (0.0 when there are none)
    pub fn proper_ratio(&self) -> f64 {
        if self.total_reps == 0 {
            return 0.0;
        }
        (self.total_reps - self.improper_reps) as f64 / self.total_reps as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squat_engine::{quality_score, SquatPhase, ViolationKind, ViolationSet};

    fn rep(peak: f64, back: Option<f64>, violation: Option<ViolationKind>) -> Rep {
        let mut violations = ViolationSet::default();
        if let Some(kind) = violation {
            violations.insert(kind);
        }
        Rep {
            start_frame: 0,
            end_frame: 30,
            start_ms: 0,
            end_ms: 1000,
            deepest_phase: SquatPhase::Pass,
            improper: violations.any(),
            violations,
            peak_knee_angle: peak,
            hip_angle_at_peak: back,
            quality: quality_score(&violations, SquatPhase::Pass),
        }
    }

    #[test]
    fn test_empty_is_neutral() {
        let summary = WorkoutSummary::from_reps(&[]);
        assert_eq!(summary, WorkoutSummary::default());
        assert_eq!(summary.average_quality, 0.0);
        assert_eq!(summary.depth_consistency, 0.0);
        assert_eq!(summary.proper_ratio(), 0.0);
    }

    #[test]
    fn test_counts_and_quality() {
        let reps = [
            rep(85.0, Some(30.0), None),
            rep(84.0, Some(31.0), Some(ViolationKind::AnkleAngle)),
            rep(86.0, Some(29.0), None),
        ];
        let summary = WorkoutSummary::from_reps(&reps);
        assert_eq!(summary.total_reps, 3);
        assert_eq!(summary.improper_reps, 1);
        assert_eq!(summary.best_rep_quality, 100.0);
        assert!((summary.average_quality - (280.0 / 3.0)).abs() < 1e-9);
        assert!((summary.proper_ratio() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let reps = [rep(80.0, Some(25.0), None), rep(90.0, None, None)];
        assert_eq!(
            WorkoutSummary::from_reps(&reps),
            WorkoutSummary::from_reps(&reps)
        );
    }

    #[test]
    fn test_steady_depth_scores_higher() {
        let steady = [rep(85.0, Some(30.0), None), rep(86.0, Some(30.0), None)];
        let erratic = [rep(72.0, Some(30.0), None), rep(94.0, Some(30.0), None)];
        let steady = WorkoutSummary::from_reps(&steady);
        let erratic = WorkoutSummary::from_reps(&erratic);
        assert!(steady.depth_consistency > erratic.depth_consistency);
        assert_eq!(steady.back_angle_consistency, 100.0);
    }

    #[test]
    fn test_missing_back_angles_are_skipped() {
        let reps = [rep(85.0, None, None), rep(85.0, None, None)];
        let summary = WorkoutSummary::from_reps(&reps);
        assert_eq!(summary.depth_consistency, 100.0);
        assert_eq!(summary.back_angle_consistency, 0.0);
    }

    #[test]
    fn test_serialized_keys() {
        let summary = WorkoutSummary::from_reps(&[rep(85.0, Some(30.0), None)]);
        let json = serde_json::to_value(summary).unwrap();
        let mut keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "average_quality",
                "back_angle_consistency",
                "best_rep_quality",
                "depth_consistency",
                "improper_reps",
                "total_reps",
            ]
        );
        assert_eq!(json["total_reps"], 1);
    }
}
