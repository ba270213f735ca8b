use serde::Serialize;

use crate::scoring::domain::attack_type::AttackType;
use crate::scoring::domain::frame_signals::FrameSignals;

/// Outcome of the active blink check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlinkOutcome {
    pub blink_count: usize,
    pub natural: bool,
    pub durations_ms: Vec<f64>,
}

/// Terminal verdict of one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LivenessResult {
    pub passed: bool,
    pub confidence: f64,
    /// Per-component median of the passive history.
    pub signals: FrameSignals,
    pub blink: Option<BlinkOutcome>,
    /// Only set when the session failed.
    pub attack_type: Option<AttackType>,
}

/// Where a session currently stands.
///
/// Stages only move forward; `Completed` is terminal until reset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum LivenessStage {
    Initializing,
    FaceAlignment,
    PassiveAnalysis {
        frame_count: usize,
        total: usize,
        signals: Option<FrameSignals>,
    },
    ActivePrompt {
        blink_count: usize,
        required: usize,
    },
    Completed(LivenessResult),
}

impl LivenessStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn result(&self) -> Option<&LivenessResult> {
        match self {
            Self::Completed(result) => Some(result),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::FaceAlignment => "face_alignment",
            Self::PassiveAnalysis { .. } => "passive_analysis",
            Self::ActivePrompt { .. } => "active_prompt",
            Self::Completed(_) => "completed",
        }
    }
}
