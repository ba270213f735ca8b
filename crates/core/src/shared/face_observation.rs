use serde::{Deserialize, Serialize};

use crate::shared::face_box::FaceBox;

/// Eye openness reported when the detector gives no probability.
pub const NEUTRAL_EYE_OPENNESS: f64 = 0.5;

/// Head rotation in degrees, as reported by the face detector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl HeadPose {
    pub fn new(yaw: f64, pitch: f64, roll: f64) -> Self {
        Self { yaw, pitch, roll }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.yaw, self.pitch, self.roll]
    }
}

/// Everything the external face detector tells us about one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    pub face_box: Option<FaceBox>,
    pub head_pose: HeadPose,
    pub left_eye_open: Option<f64>,
    pub right_eye_open: Option<f64>,
}

impl FaceObservation {
    /// Mean of the available eye-open probabilities, or neutral when none.
    pub fn eye_openness(&self) -> f64 {
        match (self.left_eye_open, self.right_eye_open) {
            (Some(l), Some(r)) => (l + r) / 2.0,
            (Some(p), None) | (None, Some(p)) => p,
            (None, None) => NEUTRAL_EYE_OPENNESS,
        }
    }
}
