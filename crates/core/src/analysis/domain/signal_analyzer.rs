use thiserror::Error;

use crate::shared::frame::Frame;

/// Why a single analyzer could not produce a score for one frame.
///
/// Never surfaced to callers: the analyzer suite substitutes the neutral
/// score and moves on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("frame {width}x{height} is smaller than {min}x{min}")]
    TooSmall { width: u32, height: u32, min: u32 },
    #[error("pixel buffer has {actual} bytes, expected {expected}")]
    BufferMismatch { expected: usize, actual: usize },
    #[error("sample region is empty")]
    EmptySample,
    #[error("{0} produced a non-finite value")]
    NonFinite(&'static str),
}

/// Domain interface for a stateless per-frame liveness signal.
///
/// Implementations score a cropped face in [0, 1]. `Sync` so the suite can
/// fan analyzers out across threads within one frame.
pub trait SignalAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    fn analyze(&self, face: &Frame) -> Result<f64, AnalysisError>;
}

/// Single-channel luma plane, row-major.
pub struct GrayPlane {
    pixels: Vec<f64>,
    width: usize,
    height: usize,
}

impl GrayPlane {
    /// Validate `frame` and convert it to luma.
    ///
    /// `min_side` is the smallest width/height the caller's kernel needs.
    pub fn from_frame(frame: &Frame, min_side: u32) -> Result<Self, AnalysisError> {
        check_buffer(frame)?;
        if frame.width() < min_side || frame.height() < min_side {
            return Err(AnalysisError::TooSmall {
                width: frame.width(),
                height: frame.height(),
                min: min_side,
            });
        }
        Ok(Self {
            pixels: frame.to_grayscale(),
            width: frame.width() as usize,
            height: frame.height() as usize,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[f64] {
        &self.pixels
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f64 {
        self.pixels[y * self.width + x]
    }
}

pub fn check_buffer(frame: &Frame) -> Result<(), AnalysisError> {
    let expected = frame.width() as usize * frame.height() as usize * frame.channels() as usize;
    if frame.channels() < 3 || frame.data().len() != expected {
        return Err(AnalysisError::BufferMismatch {
            expected: frame.width() as usize * frame.height() as usize * 3,
            actual: frame.data().len(),
        });
    }
    Ok(())
}

/// Reject NaN/inf intermediates and clamp the final score to [0, 1].
pub fn finite_score(name: &'static str, score: f64) -> Result<f64, AnalysisError> {
    if !score.is_finite() {
        return Err(AnalysisError::NonFinite(name));
    }
    Ok(score.clamp(0.0, 1.0))
}
