//! Analysed body side

use crate::{FrameLandmarks, LandmarkId};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Body side facing the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySide {
    Left,
    Right,
}

/// Landmark identities of one side's kinematic chain
#[derive(Debug, Clone, Copy)]
pub struct SideLandmarks {
    pub shoulder: LandmarkId,
    pub hip: LandmarkId,
    pub knee: LandmarkId,
    pub ankle: LandmarkId,
}

impl SideLandmarks {
    fn ids(&self) -> [LandmarkId; 4] {
        [self.shoulder, self.hip, self.knee, self.ankle]
    }
}

impl BodySide {
    pub fn landmarks(self) -> SideLandmarks {
        match self {
            BodySide::Left => SideLandmarks {
                shoulder: LandmarkId::LeftShoulder,
                hip: LandmarkId::LeftHip,
                knee: LandmarkId::LeftKnee,
                ankle: LandmarkId::LeftAnkle,
            },
            BodySide::Right => SideLandmarks {
                shoulder: LandmarkId::RightShoulder,
                hip: LandmarkId::RightHip,
                knee: LandmarkId::RightKnee,
                ankle: LandmarkId::RightAnkle,
            },
        }
    }

    /// Pick the side the detector sees best (highest summed visibility).
    /// Ties go to the left side.
    pub fn most_visible(frame: &FrameLandmarks) -> BodySide {
        let score = |side: BodySide| -> f64 {
            side.landmarks()
                .ids()
                .iter()
                .map(|id| frame.visibility(*id))
                .sum()
        };

        let (left, right) = (score(BodySide::Left), score(BodySide::Right));
        let side = if right > left {
            BodySide::Right
        } else {
            BodySide::Left
        };
        trace!("Side visibility left {:.2} right {:.2}, using {:?}", left, right, side);
        side
    }
}
