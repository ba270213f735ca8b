use std::collections::HashMap;
use std::sync::Arc;

use crate::scoring::domain::liveness_scorer::LivenessScorer;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Replays precomputed real-face probabilities by frame index.
///
/// Used when inference already ran elsewhere (for example on a recorded
/// session); frames without an entry report an error so the adapter falls
/// back to neutral.
pub struct CachedLivenessScorer {
    cache: Arc<HashMap<usize, f64>>,
}

impl CachedLivenessScorer {
    pub fn new(cache: Arc<HashMap<usize, f64>>) -> Self {
        Self { cache }
    }
}

impl LivenessScorer for CachedLivenessScorer {
    fn score(
        &mut self,
        frame: &Frame,
        _face_box: &FaceBox,
    ) -> Result<f64, Box<dyn std::error::Error>> {
        self.cache
            .get(&frame.index())
            .copied()
            .ok_or_else(|| format!("no cached CNN score for frame {}", frame.index()).into())
    }
}
