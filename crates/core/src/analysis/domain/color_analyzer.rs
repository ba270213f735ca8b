//! Skin-tone share of the central face region in YCrCb space.

use crate::analysis::domain::signal_analyzer::{
    check_buffer, finite_score, AnalysisError, SignalAnalyzer,
};
use crate::shared::frame::{luma, Frame};

pub const CR_RANGE: (f64, f64) = (133.0, 173.0);
pub const CB_RANGE: (f64, f64) = (77.0, 127.0);

#[derive(Debug, Default, Clone, Copy)]
pub struct ColorAnalyzer;

impl ColorAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl SignalAnalyzer for ColorAnalyzer {
    fn name(&self) -> &'static str {
        "color"
    }

    fn analyze(&self, face: &Frame) -> Result<f64, AnalysisError> {
        check_buffer(face)?;
        let ratio = skin_ratio(face)?;
        finite_score(self.name(), color_score(ratio))
    }
}

/// Fraction of skin-colored pixels in the central 50% x 50% window.
pub fn skin_ratio(face: &Frame) -> Result<f64, AnalysisError> {
    let w = face.width() as usize;
    let h = face.height() as usize;
    let (x0, y0) = (w / 4, h / 4);
    let (x1, y1) = (x0 + w / 2, y0 + h / 2);
    if x1 <= x0 || y1 <= y0 {
        return Err(AnalysisError::EmptySample);
    }

    let channels = face.channels() as usize;
    let data = face.data();
    let mut skin = 0usize;
    for y in y0..y1 {
        for x in x0..x1 {
            let offset = (y * w + x) * channels;
            if is_skin(data[offset], data[offset + 1], data[offset + 2]) {
                skin += 1;
            }
        }
    }
    Ok(skin as f64 / ((x1 - x0) * (y1 - y0)) as f64)
}

pub fn is_skin(r: u8, g: u8, b: u8) -> bool {
    let (cr, cb) = to_cr_cb(r, g, b);
    (CR_RANGE.0..=CR_RANGE.1).contains(&cr) && (CB_RANGE.0..=CB_RANGE.1).contains(&cb)
}

/// Chroma components of the YCrCb transform.
pub fn to_cr_cb(r: u8, g: u8, b: u8) -> (f64, f64) {
    let y = luma(r, g, b);
    let cr = (r as f64 - y) * 0.713 + 128.0;
    let cb = (b as f64 - y) * 0.564 + 128.0;
    (cr, cb)
}

pub fn color_score(ratio: f64) -> f64 {
    if ratio < 0.25 {
        0.4
    } else if ratio > 0.85 {
        0.5
    } else if (0.35..=0.75).contains(&ratio) {
        0.7 + (1.0 - (ratio - 0.55).abs() / 0.2) * 0.25
    } else {
        0.55
    }
}
