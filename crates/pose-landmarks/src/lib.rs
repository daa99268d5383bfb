//! Body Landmarks and Joint Geometry
//!
//! Frame-level landmark snapshots produced by an external pose detector,
//! plus the pure angle geometry the squat engine classifies on:
//! - Landmark identities and per-frame landmark maps
//! - Analysed body side selection
//! - Segment angles (vertex angles, angles from vertical)

mod frame;
pub mod geometry;
mod side;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use frame::{FrameLandmarks, Landmark, LandmarkId, POSE_LANDMARK_COUNT};
pub use geometry::{AngleSet, MIN_VISIBILITY};
pub use side::{BodySide, SideLandmarks};

use thiserror::Error;

/// Landmark input errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LandmarkError {
    #[error("Pose array has {actual} entries, expected {expected}")]
    PoseArrayLength { expected: usize, actual: usize },

    #[error("{id:?} has a non-finite coordinate")]
    NonFiniteCoordinate { id: LandmarkId },

    #[error("{id:?} visibility {value} is outside [0, 1]")]
    VisibilityOutOfRange { id: LandmarkId, value: f64 },
}
