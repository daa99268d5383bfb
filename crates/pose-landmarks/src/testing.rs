//! Synthetic side-view squat poses for tests

use crate::{FrameLandmarks, Landmark, LandmarkId};

const SHANK: f64 = 0.2;
const THIGH: f64 = 0.2;
const TORSO: f64 = 0.3;
const NECK: f64 = 0.1;

/// Builds a left-side-facing pose whose measured angles equal the requested ones.
///
/// The right-side chain mirrors the left with lower visibility, so the left
/// side is always the one analysed.
#[derive(Debug, Clone)]
pub struct SquatPoseBuilder {
    knee: f64,
    hip: f64,
    ankle: f64,
    offset: f64,
    visibility: f64,
}

impl Default for SquatPoseBuilder {
    fn default() -> Self {
        Self {
            knee: 10.0,
            hip: 25.0,
            ankle: 10.0,
            offset: 10.0,
            visibility: 0.95,
        }
    }
}

impl SquatPoseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Thigh angle from vertical
    pub fn knee(mut self, degrees: f64) -> Self {
        self.knee = degrees;
        self
    }

    /// Torso angle from vertical
    pub fn hip(mut self, degrees: f64) -> Self {
        self.hip = degrees;
        self
    }

    /// Shank angle from vertical
    pub fn ankle(mut self, degrees: f64) -> Self {
        self.ankle = degrees;
        self
    }

    /// Shoulder spread seen from the nose
    pub fn offset(mut self, degrees: f64) -> Self {
        self.offset = degrees;
        self
    }

    /// Visibility of the analysed side and the nose
    pub fn visibility(mut self, visibility: f64) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn build(&self, timestamp_ms: u64) -> FrameLandmarks {
        let step = |from: (f64, f64), length: f64, degrees: f64, forward: bool| {
            let r = degrees.to_radians();
            let dx = if forward { r.sin() } else { -r.sin() };
            (from.0 + length * dx, from.1 - length * r.cos())
        };

        let ankle = (0.5, 0.9);
        let knee = step(ankle, SHANK, self.ankle, true);
        let hip = step(knee, THIGH, self.knee, false);
        let shoulder = step(hip, TORSO, self.hip, true);

        let spread = NECK * (self.offset / 2.0).to_radians().tan();
        let nose = (shoulder.0 + spread, shoulder.1 - NECK);
        let far_shoulder = (shoulder.0 + 2.0 * spread, shoulder.1);

        let near = self.visibility;
        let far = self.visibility * 0.7;
        let at = |p: (f64, f64), v: f64| Landmark::new(p.0, p.1, v);

        let mut frame = FrameLandmarks::new(timestamp_ms);
        let points = [
            (LandmarkId::Nose, at(nose, near)),
            (LandmarkId::LeftShoulder, at(shoulder, near)),
            (LandmarkId::RightShoulder, at(far_shoulder, far)),
            (LandmarkId::LeftHip, at(hip, near)),
            (LandmarkId::RightHip, at(hip, far)),
            (LandmarkId::LeftKnee, at(knee, near)),
            (LandmarkId::RightKnee, at(knee, far)),
            (LandmarkId::LeftAnkle, at(ankle, near)),
            (LandmarkId::RightAnkle, at(ankle, far)),
        ];
        for (id, landmark) in points {
            frame.landmarks.insert(id, landmark);
        }
        frame
    }
}
