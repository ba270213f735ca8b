//! Laplacian-variance focus measure. Recaptured media is usually softer.

use crate::analysis::domain::signal_analyzer::{
    finite_score, AnalysisError, GrayPlane, SignalAnalyzer,
};
use crate::shared::frame::Frame;
use crate::shared::stats;

/// Laplacian standard deviation that maps to a normalized sharpness of 1.0.
pub const LAPLACIAN_STD_SCALE: f64 = 50.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct SharpnessAnalyzer;

impl SharpnessAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl SignalAnalyzer for SharpnessAnalyzer {
    fn name(&self) -> &'static str {
        "sharpness"
    }

    fn analyze(&self, face: &Frame) -> Result<f64, AnalysisError> {
        let plane = GrayPlane::from_frame(face, 3)?;
        let responses = laplacian_responses(&plane);
        let normalized = (stats::std_dev(&responses) / LAPLACIAN_STD_SCALE).clamp(0.0, 2.0);
        finite_score(self.name(), sharpness_score(normalized))
    }
}

/// 4-neighbor Laplacian `[0,1,0; 1,-4,1; 0,1,0]` at every interior pixel.
pub fn laplacian_responses(plane: &GrayPlane) -> Vec<f64> {
    let mut responses = Vec::with_capacity((plane.width() - 2) * (plane.height() - 2));
    for y in 1..plane.height() - 1 {
        for x in 1..plane.width() - 1 {
            responses.push(
                plane.at(x, y - 1) + plane.at(x, y + 1) + plane.at(x - 1, y) + plane.at(x + 1, y)
                    - 4.0 * plane.at(x, y),
            );
        }
    }
    responses
}

/// Map normalized Laplacian spread in [0, 2] to a score; the linear band
/// tops out above 1.0 and is clamped by the caller.
pub fn sharpness_score(normalized: f64) -> f64 {
    if normalized < 0.2 {
        0.4
    } else if normalized > 1.5 {
        0.6
    } else {
        0.55 + normalized * 0.35
    }
}
