//! Frame-difference motion statistics over a rolling history.
//!
//! A photo held still produces almost no difference between frames, a video
//! replay produces unnaturally smooth motion, and a live face produces small
//! irregular changes.

use crate::analysis::domain::signal_analyzer::{check_buffer, finite_score, AnalysisError};
use crate::shared::constants::{DEFAULT_MOTION_HISTORY, NEUTRAL_SCORE};
use crate::shared::frame::Frame;
use crate::shared::rolling_window::RollingWindow;
use crate::shared::stats;

/// Magnitude recorded for the first frame of a sequence.
pub const FIRST_FRAME_MAGNITUDE: f64 = 10.0;

/// Sampling stride in both dimensions when diffing frames.
pub const SAMPLE_STRIDE: usize = 4;

/// History entries required before the score leaves neutral.
pub const MIN_HISTORY: usize = 3;

struct PreviousFrame {
    gray: Vec<f64>,
    width: u32,
    height: u32,
}

pub struct MotionAnalyzer {
    previous: Option<PreviousFrame>,
    history: RollingWindow<f64>,
}

impl MotionAnalyzer {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            previous: None,
            history: RollingWindow::new(history_capacity),
        }
    }

    /// Record `frame` and score the motion history including it.
    pub fn analyze(&mut self, frame: &Frame) -> Result<f64, AnalysisError> {
        check_buffer(frame)?;
        let gray = frame.to_grayscale();

        let magnitude = match &self.previous {
            Some(prev) if prev.width == frame.width() && prev.height == frame.height() => {
                difference_magnitude(&prev.gray, &gray, frame.width() as usize)
            }
            _ => FIRST_FRAME_MAGNITUDE,
        };
        if !magnitude.is_finite() {
            return Err(AnalysisError::NonFinite("motion"));
        }

        self.previous = Some(PreviousFrame {
            gray,
            width: frame.width(),
            height: frame.height(),
        });
        self.history.push(magnitude);

        if self.history.len() < MIN_HISTORY {
            return Ok(NEUTRAL_SCORE);
        }
        let values: Vec<f64> = self.history.iter().copied().collect();
        finite_score(
            "motion",
            motion_score(stats::mean(&values), stats::std_dev(&values)),
        )
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.history.clear();
    }
}

impl Default for MotionAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_MOTION_HISTORY)
    }
}

/// Standard deviation of sampled absolute pixel differences.
fn difference_magnitude(previous: &[f64], current: &[f64], width: usize) -> f64 {
    let height = current.len() / width.max(1);
    let mut diffs = Vec::with_capacity((width / SAMPLE_STRIDE + 1) * (height / SAMPLE_STRIDE + 1));
    for y in (0..height).step_by(SAMPLE_STRIDE) {
        for x in (0..width).step_by(SAMPLE_STRIDE) {
            let i = y * width + x;
            diffs.push((current[i] - previous[i]).abs());
        }
    }
    stats::std_dev(&diffs)
}

pub fn motion_score(mean: f64, std_dev: f64) -> f64 {
    if mean < 2.0 && std_dev < 1.0 {
        // too still
        0.3
    } else if mean > 50.0 {
        // too erratic
        0.4
    } else if std_dev < 2.0 && mean > 5.0 {
        // too smooth
        0.4
    } else {
        0.6 + (std_dev.clamp(2.0, 15.0) - 2.0) / 13.0 * 0.3
    }
}
