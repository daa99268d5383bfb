//! Joint angle geometry
//!
//! All angles are in degrees within [0, 180], measured in the image plane.
//! `None` means the angle could not be measured (a required landmark is
//! absent, below the confidence floor, or the segment has zero length);
//! it never stands in for 0°.

use crate::{BodySide, FrameLandmarks, Landmark, LandmarkId};
use serde::{Deserialize, Serialize};

/// Minimum landmark visibility for an angle to be measured
pub const MIN_VISIBILITY: f64 = 0.5;

const MIN_SEGMENT_LENGTH: f64 = 1e-9;

fn angle_between(v1: (f64, f64), v2: (f64, f64)) -> Option<f64> {
    let n1 = v1.0.hypot(v1.1);
    let n2 = v2.0.hypot(v2.1);
    if n1 < MIN_SEGMENT_LENGTH || n2 < MIN_SEGMENT_LENGTH {
        return None;
    }

    let cos = ((v1.0 * v2.0 + v1.1 * v2.1) / (n1 * n2)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

fn ray(from: &Landmark, to: &Landmark) -> (f64, f64) {
    (to.x - from.x, to.y - from.y)
}

/// Angle at `vertex` formed by the rays towards `a` and `b`
pub fn vertex_angle(vertex: &Landmark, a: &Landmark, b: &Landmark, floor: f64) -> Option<f64> {
    if ![vertex, a, b].iter().all(|l| l.is_visible(floor)) {
        return None;
    }
    angle_between(ray(vertex, a), ray(vertex, b))
}

/// Angle between the segment `vertex -> point` and the upward vertical through `vertex`
pub fn angle_from_vertical(vertex: &Landmark, point: &Landmark, floor: f64) -> Option<f64> {
    if !vertex.is_visible(floor) || !point.is_visible(floor) {
        return None;
    }
    // Image y grows downward
    angle_between(ray(vertex, point), (0.0, -1.0))
}

/// Per-frame angles used for phase classification and form checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AngleSet {
    /// Side the chain angles were measured on
    pub side: Option<BodySide>,
    /// Thigh (knee -> hip) from vertical; drives squat phase
    pub knee_vertical: Option<f64>,
    /// Torso (hip -> shoulder) from vertical; forward/backward lean
    pub hip_vertical: Option<f64>,
    /// Shank (ankle -> knee) from vertical; knee travel over the toes
    pub ankle_vertical: Option<f64>,
    /// Angle at the nose between both shoulders; camera alignment
    pub offset: Option<f64>,
}

impl AngleSet {
    /// Measure all angles on the better-seen side of the body
    pub fn from_frame(frame: &FrameLandmarks, floor: f64) -> Self {
        let side = BodySide::most_visible(frame);
        let ids = side.landmarks();
        let get = |id: LandmarkId| frame.get(id);

        let pair = |a: LandmarkId, b: LandmarkId| -> Option<f64> {
            angle_from_vertical(get(a)?, get(b)?, floor)
        };

        let offset = (|| {
            vertex_angle(
                get(LandmarkId::Nose)?,
                get(LandmarkId::LeftShoulder)?,
                get(LandmarkId::RightShoulder)?,
                floor,
            )
        })();

        Self {
            side: Some(side),
            knee_vertical: pair(ids.knee, ids.hip),
            hip_vertical: pair(ids.hip, ids.shoulder),
            ankle_vertical: pair(ids.ankle, ids.knee),
            offset,
        }
    }

    /// Whether the phase-driving angle could be measured
    pub fn is_valid(&self) -> bool {
        self.knee_vertical.is_some()
    }
}
