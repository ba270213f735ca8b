use serde::{Deserialize, Serialize};

use crate::shared::constants::NEUTRAL_SCORE;
use crate::shared::stats;

/// Raw per-signal scores for one frame, each in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub cnn: f64,
    pub texture: f64,
    pub frequency: f64,
    pub color: f64,
    pub sharpness: f64,
    pub motion: f64,
    pub depth: f64,
}

impl ComponentScores {
    pub fn uniform(value: f64) -> Self {
        Self {
            cnn: value,
            texture: value,
            frequency: value,
            color: value,
            sharpness: value,
            motion: value,
            depth: value,
        }
    }

    pub fn neutral() -> Self {
        Self::uniform(NEUTRAL_SCORE)
    }

    /// Force every component into [0, 1]; NaN becomes neutral.
    pub fn clamped(self) -> Self {
        let fix = |v: f64| {
            if v.is_nan() {
                NEUTRAL_SCORE
            } else {
                v.clamp(0.0, 1.0)
            }
        };
        Self {
            cnn: fix(self.cnn),
            texture: fix(self.texture),
            frequency: fix(self.frequency),
            color: fix(self.color),
            sharpness: fix(self.sharpness),
            motion: fix(self.motion),
            depth: fix(self.depth),
        }
    }
}

/// Fused result for one frame (or an aggregate over a session).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameSignals {
    pub cnn: f64,
    pub texture: f64,
    pub frequency: f64,
    pub color: f64,
    pub sharpness: f64,
    pub motion: f64,
    pub depth: f64,
    pub final_score: f64,
}

impl FrameSignals {
    pub fn new(components: ComponentScores, final_score: f64) -> Self {
        Self {
            cnn: components.cnn,
            texture: components.texture,
            frequency: components.frequency,
            color: components.color,
            sharpness: components.sharpness,
            motion: components.motion,
            depth: components.depth,
            final_score,
        }
    }

    /// All-neutral signals, used when no passive history exists.
    pub fn neutral() -> Self {
        Self::new(ComponentScores::neutral(), NEUTRAL_SCORE)
    }

    pub fn components(&self) -> ComponentScores {
        ComponentScores {
            cnn: self.cnn,
            texture: self.texture,
            frequency: self.frequency,
            color: self.color,
            sharpness: self.sharpness,
            motion: self.motion,
            depth: self.depth,
        }
    }

    /// Per-component median across `history`, including `final_score`.
    ///
    /// Returns `None` for an empty history. The result does not depend on
    /// the order of `history`.
    pub fn median_of(history: &[FrameSignals]) -> Option<FrameSignals> {
        if history.is_empty() {
            return None;
        }
        let column = |f: fn(&FrameSignals) -> f64| {
            let values: Vec<f64> = history.iter().map(f).collect();
            stats::median(&values)
        };
        Some(FrameSignals {
            cnn: column(|s| s.cnn),
            texture: column(|s| s.texture),
            frequency: column(|s| s.frequency),
            color: column(|s| s.color),
            sharpness: column(|s| s.sharpness),
            motion: column(|s| s.motion),
            depth: column(|s| s.depth),
            final_score: column(|s| s.final_score),
        })
    }
}
