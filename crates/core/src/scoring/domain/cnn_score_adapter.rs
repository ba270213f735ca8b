use crate::scoring::domain::liveness_scorer::LivenessScorer;
use crate::shared::constants::NEUTRAL_SCORE;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Presents the external model as one more [0, 1] signal.
///
/// Inference errors and out-of-contract values degrade to the neutral
/// score instead of propagating.
pub struct CnnScoreAdapter {
    scorer: Box<dyn LivenessScorer>,
}

impl CnnScoreAdapter {
    pub fn new(scorer: Box<dyn LivenessScorer>) -> Self {
        Self { scorer }
    }

    pub fn score(&mut self, frame: &Frame, face_box: &FaceBox) -> f64 {
        match self.scorer.score(frame, face_box) {
            Ok(p) if p.is_finite() && (0.0..=1.0).contains(&p) => p,
            Ok(p) => {
                log::warn!(
                    "CNN score {p} outside [0, 1] for frame {}, using neutral",
                    frame.index()
                );
                NEUTRAL_SCORE
            }
            Err(e) => {
                log::warn!("CNN inference failed for frame {}: {e}", frame.index());
                NEUTRAL_SCORE
            }
        }
    }
}
