//! Landmark and frame types

use crate::LandmarkError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of entries in a full MediaPipe-style pose array
pub const POSE_LANDMARK_COUNT: usize = 33;

/// Anatomical landmark identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkId {
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftFootIndex,
    RightFootIndex,
}

impl LandmarkId {
    /// All tracked identities, in pose-array order
    pub const ALL: [LandmarkId; 11] = [
        LandmarkId::Nose,
        LandmarkId::LeftShoulder,
        LandmarkId::RightShoulder,
        LandmarkId::LeftHip,
        LandmarkId::RightHip,
        LandmarkId::LeftKnee,
        LandmarkId::RightKnee,
        LandmarkId::LeftAnkle,
        LandmarkId::RightAnkle,
        LandmarkId::LeftFootIndex,
        LandmarkId::RightFootIndex,
    ];

    /// Index of this landmark in a 33-point pose array
    pub fn pose_index(self) -> usize {
        match self {
            LandmarkId::Nose => 0,
            LandmarkId::LeftShoulder => 11,
            LandmarkId::RightShoulder => 12,
            LandmarkId::LeftHip => 23,
            LandmarkId::RightHip => 24,
            LandmarkId::LeftKnee => 25,
            LandmarkId::RightKnee => 26,
            LandmarkId::LeftAnkle => 27,
            LandmarkId::RightAnkle => 28,
            LandmarkId::LeftFootIndex => 31,
            LandmarkId::RightFootIndex => 32,
        }
    }
}

/// Single detected landmark in normalized image coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    /// Depth, when the detector provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    /// Detection confidence (0-1)
    pub visibility: f64,
}

impl Landmark {
    /// Create a 2D landmark
    pub fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility,
        }
    }

    /// Whether the detector is confident enough in this point
    pub fn is_visible(&self, floor: f64) -> bool {
        self.visibility >= floor
    }

    fn check(&self, id: LandmarkId) -> Result<(), LandmarkError> {
        let z_finite = self.z.map_or(true, f64::is_finite);
        if !self.x.is_finite() || !self.y.is_finite() || !z_finite {
            return Err(LandmarkError::NonFiniteCoordinate { id });
        }
        if !(0.0..=1.0).contains(&self.visibility) {
            return Err(LandmarkError::VisibilityOutOfRange {
                id,
                value: self.visibility,
            });
        }
        Ok(())
    }
}

/// All landmarks detected in one video frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameLandmarks {
    /// Capture timestamp (milliseconds from stream start)
    pub timestamp_ms: u64,
    /// Detected points; absent entries were not found by the detector
    #[serde(default)]
    pub landmarks: BTreeMap<LandmarkId, Landmark>,
}

impl FrameLandmarks {
    /// Create an empty frame
    pub fn new(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            landmarks: BTreeMap::new(),
        }
    }

    /// Build a frame from a full 33-point pose array
    pub fn from_pose_array(timestamp_ms: u64, points: &[Landmark]) -> Result<Self, LandmarkError> {
        if points.len() != POSE_LANDMARK_COUNT {
            return Err(LandmarkError::PoseArrayLength {
                expected: POSE_LANDMARK_COUNT,
                actual: points.len(),
            });
        }

        let mut frame = Self::new(timestamp_ms);
        for id in LandmarkId::ALL {
            frame.insert(id, points[id.pose_index()])?;
        }
        Ok(frame)
    }

    /// Insert a landmark after checking it is well-formed
    pub fn insert(&mut self, id: LandmarkId, landmark: Landmark) -> Result<(), LandmarkError> {
        landmark.check(id)?;
        self.landmarks.insert(id, landmark);
        Ok(())
    }

    /// Check every landmark (used after deserializing external input)
    pub fn validate(&self) -> Result<(), LandmarkError> {
        self.landmarks
            .iter()
            .try_for_each(|(id, landmark)| landmark.check(*id))
    }

    /// Get a landmark regardless of confidence
    pub fn get(&self, id: LandmarkId) -> Option<&Landmark> {
        self.landmarks.get(&id)
    }

    /// Get a landmark only if its visibility reaches `floor`
    pub fn visible(&self, id: LandmarkId, floor: f64) -> Option<&Landmark> {
        self.get(id).filter(|l| l.is_visible(floor))
    }

    /// Visibility of a landmark, 0 when absent
    pub fn visibility(&self, id: LandmarkId) -> f64 {
        self.get(id).map_or(0.0, |l| l.visibility)
    }
}
