//! Gradient-energy split between high and low spatial frequencies.
//!
//! Screen replays add moiré, which shows up as a narrow band of strong
//! gradients; live faces sit in a moderate band.

use crate::analysis::domain::signal_analyzer::{
    finite_score, AnalysisError, GrayPlane, SignalAnalyzer,
};
use crate::shared::frame::Frame;

/// Gradient magnitude above which energy counts as high-frequency.
pub const HIGH_FREQUENCY_MAGNITUDE: f64 = 50.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct FrequencyAnalyzer;

impl FrequencyAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl SignalAnalyzer for FrequencyAnalyzer {
    fn name(&self) -> &'static str {
        "frequency"
    }

    fn analyze(&self, face: &Frame) -> Result<f64, AnalysisError> {
        let plane = GrayPlane::from_frame(face, 3)?;
        let ratio = high_frequency_ratio(&plane);
        finite_score(self.name(), frequency_score(ratio))
    }
}

/// Share of total gradient energy carried by high-magnitude gradients.
///
/// A perfectly flat image has no energy at all and reports 0.
pub fn high_frequency_ratio(plane: &GrayPlane) -> f64 {
    let mut high = 0.0;
    let mut low = 0.0;
    for y in 1..plane.height() - 1 {
        for x in 1..plane.width() - 1 {
            let gx = plane.at(x + 1, y) - plane.at(x - 1, y);
            let gy = plane.at(x, y + 1) - plane.at(x, y - 1);
            let magnitude = (gx * gx + gy * gy).sqrt();
            if magnitude > HIGH_FREQUENCY_MAGNITUDE {
                high += magnitude;
            } else {
                low += magnitude;
            }
        }
    }
    let total = high + low;
    if total > 0.0 {
        high / total
    } else {
        0.0
    }
}

pub fn frequency_score(ratio: f64) -> f64 {
    if ratio < 0.05 {
        0.4
    } else if ratio > 0.4 {
        0.5
    } else {
        0.6 + (1.0 - (ratio - 0.15).abs() / 0.15) * 0.3
    }
}
