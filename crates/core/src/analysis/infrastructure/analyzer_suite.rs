use crate::analysis::domain::color_analyzer::ColorAnalyzer;
use crate::analysis::domain::depth_analyzer::DepthAnalyzer;
use crate::analysis::domain::frequency_analyzer::FrequencyAnalyzer;
use crate::analysis::domain::motion_analyzer::MotionAnalyzer;
use crate::analysis::domain::sharpness_analyzer::SharpnessAnalyzer;
use crate::analysis::domain::signal_analyzer::{AnalysisError, SignalAnalyzer};
use crate::analysis::domain::signal_extractor::SignalExtractor;
use crate::analysis::domain::texture_analyzer::TextureAnalyzer;
use crate::scoring::domain::cnn_score_adapter::CnnScoreAdapter;
use crate::scoring::domain::frame_signals::ComponentScores;
use crate::scoring::domain::liveness_scorer::LivenessScorer;
use crate::shared::config::LivenessConfig;
use crate::shared::constants::NEUTRAL_SCORE;
use crate::shared::face_box::FaceBox;
use crate::shared::face_observation::FaceObservation;
use crate::shared::frame::Frame;

/// Default [`SignalExtractor`]: the six signal analyzers plus the CNN.
///
/// Texture, frequency, color and sharpness score the face crop and share
/// no state, so with `parallel` set they run on scoped threads and are
/// joined before the stateful analyzers update. Motion scores the full
/// frame; depth scores the head pose.
pub struct AnalyzerSuite {
    texture: TextureAnalyzer,
    frequency: FrequencyAnalyzer,
    color: ColorAnalyzer,
    sharpness: SharpnessAnalyzer,
    motion: MotionAnalyzer,
    depth: DepthAnalyzer,
    cnn: CnnScoreAdapter,
    parallel: bool,
}

struct CropScores {
    texture: f64,
    frequency: f64,
    color: f64,
    sharpness: f64,
}

impl AnalyzerSuite {
    pub fn new(scorer: Box<dyn LivenessScorer>, config: &LivenessConfig) -> Self {
        Self {
            texture: TextureAnalyzer::new(),
            frequency: FrequencyAnalyzer::new(),
            color: ColorAnalyzer::new(),
            sharpness: SharpnessAnalyzer::new(),
            motion: MotionAnalyzer::new(config.motion_history),
            depth: DepthAnalyzer::new(config.depth_history),
            cnn: CnnScoreAdapter::new(scorer),
            parallel: config.parallel_analysis,
        }
    }

    fn score_crop(&self, face: &Frame) -> CropScores {
        if self.parallel {
            // Borrow the analyzers alone; the suite itself is not Sync.
            let (texture, frequency, color) = (&self.texture, &self.frequency, &self.color);
            std::thread::scope(|s| {
                let texture = s.spawn(move || neutral_on_error(texture, face));
                let frequency = s.spawn(move || neutral_on_error(frequency, face));
                let color = s.spawn(move || neutral_on_error(color, face));
                let sharpness = neutral_on_error(&self.sharpness, face);
                CropScores {
                    texture: texture.join().unwrap_or(NEUTRAL_SCORE),
                    frequency: frequency.join().unwrap_or(NEUTRAL_SCORE),
                    color: color.join().unwrap_or(NEUTRAL_SCORE),
                    sharpness,
                }
            })
        } else {
            CropScores {
                texture: neutral_on_error(&self.texture, face),
                frequency: neutral_on_error(&self.frequency, face),
                color: neutral_on_error(&self.color, face),
                sharpness: neutral_on_error(&self.sharpness, face),
            }
        }
    }
}

impl SignalExtractor for AnalyzerSuite {
    fn extract(&mut self, frame: &Frame, observation: &FaceObservation) -> ComponentScores {
        let face_box = observation
            .face_box
            .unwrap_or_else(|| FaceBox::centered(frame.width(), frame.height()));
        let crop = if frame.is_well_formed() {
            frame.crop(&face_box)
        } else {
            frame.clone()
        };

        let crop_scores = self.score_crop(&crop);
        let motion = neutral_or("motion", self.motion.analyze(frame));
        let depth = neutral_or("depth", self.depth.analyze(observation.head_pose));
        let cnn = self.cnn.score(frame, &face_box);

        ComponentScores {
            cnn,
            texture: crop_scores.texture,
            frequency: crop_scores.frequency,
            color: crop_scores.color,
            sharpness: crop_scores.sharpness,
            motion,
            depth,
        }
        .clamped()
    }

    fn reset(&mut self) {
        self.motion.reset();
        self.depth.reset();
    }
}

fn neutral_on_error(analyzer: &dyn SignalAnalyzer, face: &Frame) -> f64 {
    neutral_or(analyzer.name(), analyzer.analyze(face))
}

fn neutral_or(name: &str, result: Result<f64, AnalysisError>) -> f64 {
    match result {
        Ok(score) => score,
        Err(e) => {
            log::debug!("{name} analyzer fell back to neutral: {e}");
            NEUTRAL_SCORE
        }
    }
}
