//! Local Binary Pattern texture analysis.
//!
//! Printed photos and flat replays carry a uniform micro-texture whose LBP
//! histogram is concentrated in a few codes; live skin spreads over many.

use crate::analysis::domain::signal_analyzer::{
    finite_score, AnalysisError, GrayPlane, SignalAnalyzer,
};
use crate::shared::frame::Frame;
use crate::shared::stats;

/// Neighbor offsets in bit order: top-left = bit 0 ... left = bit 7.
const NEIGHBORS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct TextureAnalyzer;

impl TextureAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl SignalAnalyzer for TextureAnalyzer {
    fn name(&self) -> &'static str {
        "texture"
    }

    fn analyze(&self, face: &Frame) -> Result<f64, AnalysisError> {
        let plane = GrayPlane::from_frame(face, 3)?;
        let histogram = lbp_histogram(&plane);
        let entropy = stats::shannon_entropy(&histogram) / (256f64).ln();
        finite_score(self.name(), texture_score(entropy))
    }
}

/// 256-bin histogram of LBP codes over interior pixels.
pub fn lbp_histogram(plane: &GrayPlane) -> [u64; 256] {
    let mut histogram = [0u64; 256];
    for y in 1..plane.height() - 1 {
        for x in 1..plane.width() - 1 {
            histogram[lbp_code(plane, x, y) as usize] += 1;
        }
    }
    histogram
}

fn lbp_code(plane: &GrayPlane, x: usize, y: usize) -> u8 {
    let center = plane.at(x, y);
    let mut code = 0u8;
    for (bit, (dx, dy)) in NEIGHBORS.iter().enumerate() {
        let nx = (x as isize + dx) as usize;
        let ny = (y as isize + dy) as usize;
        if plane.at(nx, ny) >= center {
            code |= 1 << bit;
        }
    }
    code
}

/// Map normalized entropy in [0, 1] to a liveness score.
pub fn texture_score(entropy: f64) -> f64 {
    if entropy < 0.3 {
        0.3 + entropy
    } else if entropy > 0.95 {
        0.7
    } else {
        0.5 + entropy * 0.4
    }
}
