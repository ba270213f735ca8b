//! Head-pose variance as a depth cue. A flat artifact rotates rigidly or
//! not at all; a real head produces small, independent angle changes.

use crate::analysis::domain::signal_analyzer::{finite_score, AnalysisError};
use crate::shared::constants::{DEFAULT_DEPTH_HISTORY, NEUTRAL_SCORE};
use crate::shared::face_observation::HeadPose;
use crate::shared::rolling_window::RollingWindow;
use crate::shared::stats;

pub const MIN_HISTORY: usize = 5;

pub struct DepthAnalyzer {
    history: RollingWindow<[f64; 3]>,
}

impl DepthAnalyzer {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            history: RollingWindow::new(history_capacity),
        }
    }

    pub fn analyze(&mut self, pose: HeadPose) -> Result<f64, AnalysisError> {
        let angles = pose.as_array();
        if angles.iter().any(|a| !a.is_finite()) {
            return Err(AnalysisError::NonFinite("depth"));
        }
        self.history.push(angles);

        if self.history.len() < MIN_HISTORY {
            return Ok(NEUTRAL_SCORE);
        }
        finite_score("depth", depth_score(self.total_variance()))
    }

    /// Sum of per-axis variances over the history.
    pub fn total_variance(&self) -> f64 {
        (0..3)
            .map(|axis| {
                let values: Vec<f64> = self.history.iter().map(|a| a[axis]).collect();
                stats::variance(&values)
            })
            .sum()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

impl Default for DepthAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH_HISTORY)
    }
}

pub fn depth_score(total_variance: f64) -> f64 {
    if total_variance < 1.0 {
        0.3
    } else if total_variance > 500.0 {
        0.4
    } else {
        0.5 + (total_variance.clamp(1.0, 50.0) - 1.0) / 49.0 * 0.4
    }
}
