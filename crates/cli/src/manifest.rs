use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use liveguard_core::shared::face_box::FaceBox;
use liveguard_core::shared::face_observation::{FaceObservation, HeadPose};

/// Assumed spacing of frames that carry no timestamp (~30 fps).
const DEFAULT_FRAME_INTERVAL_MS: u64 = 33;

/// A recorded session: frames in capture order plus what the face
/// detector reported for each.
#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub frames: Vec<ManifestFrame>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestFrame {
    /// Image path, relative to the manifest file.
    pub image: PathBuf,
    pub timestamp_ms: Option<u64>,
    #[serde(default)]
    pub yaw: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub roll: f64,
    pub left_eye_open: Option<f64>,
    pub right_eye_open: Option<f64>,
    pub face_box: Option<FaceBox>,
    /// Precomputed real-face probability, used when no model is given.
    pub cnn_score: Option<f64>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("failed to read manifest {}: {e}", path.display()))?;
        let mut manifest: Manifest = serde_json::from_str(&json)
            .map_err(|e| format!("failed to parse manifest {}: {e}", path.display()))?;
        if manifest.frames.is_empty() {
            return Err(format!("manifest {} lists no frames", path.display()).into());
        }

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for frame in &mut manifest.frames {
            if frame.image.is_relative() {
                frame.image = base.join(&frame.image);
            }
        }
        Ok(manifest)
    }
}

impl ManifestFrame {
    pub fn timestamp_ms(&self, index: usize) -> u64 {
        self.timestamp_ms
            .unwrap_or(index as u64 * DEFAULT_FRAME_INTERVAL_MS)
    }

    pub fn observation(&self) -> FaceObservation {
        FaceObservation {
            face_box: self.face_box,
            head_pose: HeadPose::new(self.yaw, self.pitch, self.roll),
            left_eye_open: self.left_eye_open,
            right_eye_open: self.right_eye_open,
        }
    }
}
