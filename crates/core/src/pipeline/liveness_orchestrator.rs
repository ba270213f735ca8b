use std::time::Instant;

use crate::analysis::domain::signal_extractor::SignalExtractor;
use crate::pipeline::liveness_stage::{BlinkOutcome, LivenessResult, LivenessStage};
use crate::pipeline::session_logger::{NullSessionLogger, SessionLogger};
use crate::scoring::domain::frame_signals::FrameSignals;
use crate::scoring::domain::fusion_scorer::{infer_attack_type, Decision, FusionScorer};
use crate::shared::config::{ConfigError, LivenessConfig};
use crate::shared::constants::{ACTIVE_FAIL_CONFIDENCE, ACTIVE_PASS_CONFIDENCE};
use crate::shared::face_observation::FaceObservation;
use crate::shared::frame::Frame;
use crate::verification::domain::blink_verifier::BlinkVerifier;

/// Drives one detection session from the first frame to a verdict.
///
/// Passive analysis scores `required_passive_frames` frames and decides on
/// the per-component median. An inconclusive median falls through to blink
/// verification. All session state lives here; concurrent sessions need
/// separate instances.
pub struct LivenessOrchestrator {
    config: LivenessConfig,
    scorer: FusionScorer,
    extractor: Box<dyn SignalExtractor>,
    blink: BlinkVerifier,
    history: Vec<FrameSignals>,
    aggregate: Option<FrameSignals>,
    stage: LivenessStage,
    session_start_ms: Option<u64>,
    logger: Box<dyn SessionLogger>,
}

impl LivenessOrchestrator {
    pub fn new(
        config: LivenessConfig,
        extractor: Box<dyn SignalExtractor>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let scorer = FusionScorer::new(config.weights, config.thresholds)?;
        Ok(Self {
            blink: BlinkVerifier::new(config.blink.clone()),
            history: Vec::with_capacity(config.required_passive_frames),
            config,
            scorer,
            extractor,
            aggregate: None,
            stage: LivenessStage::Initializing,
            session_start_ms: None,
            logger: Box::new(NullSessionLogger),
        })
    }

    pub fn with_logger(mut self, logger: Box<dyn SessionLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn stage(&self) -> &LivenessStage {
        &self.stage
    }

    pub fn config(&self) -> &LivenessConfig {
        &self.config
    }

    /// Passive frames recorded so far in this session.
    pub fn history(&self) -> &[FrameSignals] {
        &self.history
    }

    /// Advance the session by one frame and return the resulting stage.
    ///
    /// Frames must arrive in capture order. Once the session is completed,
    /// frames are ignored until [`reset`](Self::reset).
    pub fn process_frame(&mut self, frame: &Frame, observation: &FaceObservation) -> LivenessStage {
        if self.stage.is_terminal() {
            return self.stage.clone();
        }
        if self.deadline_passed(frame.timestamp_ms()) {
            self.fail_session("session time limit reached");
            return self.stage.clone();
        }

        match self.stage {
            LivenessStage::Initializing | LivenessStage::FaceAlignment => {
                if self.awaiting_face(observation) {
                    self.transition(LivenessStage::FaceAlignment);
                } else {
                    self.transition(LivenessStage::PassiveAnalysis {
                        frame_count: 0,
                        total: self.config.required_passive_frames,
                        signals: None,
                    });
                    self.analyze_passive(frame, observation);
                }
            }
            LivenessStage::PassiveAnalysis { .. } => {
                if !self.awaiting_face(observation) {
                    self.analyze_passive(frame, observation);
                }
            }
            LivenessStage::ActivePrompt { .. } => self.verify_blink(frame, observation),
            LivenessStage::Completed(_) => {}
        }
        self.stage.clone()
    }

    /// Force a FAIL verdict for an unfinished session.
    pub fn abort(&mut self) -> LivenessStage {
        if !self.stage.is_terminal() {
            self.fail_session("session aborted by caller");
        }
        self.stage.clone()
    }

    /// Return to `Initializing`, clearing every piece of session state.
    pub fn reset(&mut self) {
        self.history.clear();
        self.aggregate = None;
        self.blink.reset();
        self.extractor.reset();
        self.session_start_ms = None;
        self.transition(LivenessStage::Initializing);
        self.logger.reset();
    }

    fn awaiting_face(&self, observation: &FaceObservation) -> bool {
        self.config.require_face_box && observation.face_box.is_none()
    }

    fn deadline_passed(&mut self, timestamp_ms: u64) -> bool {
        let start = *self.session_start_ms.get_or_insert(timestamp_ms);
        match self.config.max_session_ms {
            Some(limit) => timestamp_ms.saturating_sub(start) >= limit,
            None => false,
        }
    }

    fn analyze_passive(&mut self, frame: &Frame, observation: &FaceObservation) {
        let total = self.config.required_passive_frames;

        let t0 = Instant::now();
        let scores = self.extractor.extract(frame, observation);
        let signals = self.scorer.fuse(scores);
        let elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0;

        self.history.push(signals);
        let frame_count = self.history.len();
        self.logger
            .frame_analyzed(frame_count, total, signals.final_score, elapsed_ms);

        if frame_count < total {
            self.stage = LivenessStage::PassiveAnalysis {
                frame_count,
                total,
                signals: Some(signals),
            };
            return;
        }
        self.decide_passive();
    }

    fn decide_passive(&mut self) {
        let aggregate = FrameSignals::median_of(&self.history).unwrap_or_else(FrameSignals::neutral);
        self.aggregate = Some(aggregate);
        let score = aggregate.final_score;

        match self.scorer.decide(score) {
            Decision::Pass => self.complete(LivenessResult {
                passed: true,
                confidence: score,
                signals: aggregate,
                blink: None,
                attack_type: None,
            }),
            Decision::Fail => self.complete(LivenessResult {
                passed: false,
                confidence: 1.0 - score,
                signals: aggregate,
                blink: None,
                attack_type: Some(infer_attack_type(&aggregate)),
            }),
            Decision::Uncertain => {
                self.logger
                    .info(&format!("passive score {score:.3} inconclusive, requesting blinks"));
                self.blink.reset();
                self.transition(LivenessStage::ActivePrompt {
                    blink_count: 0,
                    required: self.config.required_blinks,
                });
            }
        }
    }

    fn verify_blink(&mut self, frame: &Frame, observation: &FaceObservation) {
        let required = self.config.required_blinks;
        self.blink
            .update(observation.eye_openness(), frame.timestamp_ms());

        if !self.blink.is_complete(required) {
            self.stage = LivenessStage::ActivePrompt {
                blink_count: self.blink.blink_count(),
                required,
            };
            return;
        }

        let natural = self.blink.is_natural();
        let passed = natural && self.blink.is_complete(required);
        let signals = self.aggregate.unwrap_or_else(FrameSignals::neutral);
        let confidence = if passed {
            ACTIVE_PASS_CONFIDENCE
        } else {
            ACTIVE_FAIL_CONFIDENCE
        };
        self.complete(LivenessResult {
            passed,
            confidence,
            signals,
            blink: Some(BlinkOutcome {
                blink_count: self.blink.blink_count(),
                natural,
                durations_ms: self.blink.durations_ms().to_vec(),
            }),
            attack_type: (!passed).then(|| infer_attack_type(&signals)),
        });
    }

    fn fail_session(&mut self, reason: &str) {
        let signals = self
            .aggregate
            .or_else(|| FrameSignals::median_of(&self.history))
            .unwrap_or_else(FrameSignals::neutral);
        self.logger.info(reason);
        self.complete(LivenessResult {
            passed: false,
            confidence: 1.0 - signals.final_score,
            signals,
            blink: None,
            attack_type: Some(infer_attack_type(&signals)),
        });
    }

    fn complete(&mut self, result: LivenessResult) {
        let verdict = if result.passed { "PASS" } else { "FAIL" };
        match result.attack_type {
            Some(attack) => log::info!(
                "Liveness {verdict} (confidence {:.3}, suspected {attack})",
                result.confidence
            ),
            None => log::info!("Liveness {verdict} (confidence {:.3})", result.confidence),
        }
        self.stage = LivenessStage::Completed(result);
        self.logger.summary();
    }

    fn transition(&mut self, next: LivenessStage) {
        if self.stage.name() != next.name() {
            self.logger
                .info(&format!("stage {} -> {}", self.stage.name(), next.name()));
        }
        self.stage = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::domain::attack_type::AttackType;
    use crate::scoring::domain::frame_signals::ComponentScores;
    use crate::scoring::domain::fusion_scorer::{DecisionThresholds, FusionWeights};
    use crate::shared::face_box::FaceBox;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Replays a fixed score sequence; the last entry repeats.
    struct ScriptedExtractor {
        scores: Vec<ComponentScores>,
        calls: usize,
        resets: Arc<AtomicUsize>,
    }

    impl ScriptedExtractor {
        fn uniform(values: &[f64]) -> Self {
            Self {
                scores: values.iter().map(|&v| ComponentScores::uniform(v)).collect(),
                calls: 0,
                resets: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl SignalExtractor for ScriptedExtractor {
        fn extract(&mut self, _frame: &Frame, _observation: &FaceObservation) -> ComponentScores {
            let i = self.calls.min(self.scores.len() - 1);
            self.calls += 1;
            self.scores[i]
        }

        fn reset(&mut self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn frame(index: usize, timestamp_ms: u64) -> Frame {
        Frame::new(vec![0u8; 4 * 4 * 3], 4, 4, 3, index).with_timestamp_ms(timestamp_ms)
    }

    fn eyes(openness: f64) -> FaceObservation {
        FaceObservation {
            left_eye_open: Some(openness),
            right_eye_open: Some(openness),
            ..FaceObservation::default()
        }
    }

    fn orchestrator(config: LivenessConfig, values: &[f64]) -> LivenessOrchestrator {
        LivenessOrchestrator::new(config, Box::new(ScriptedExtractor::uniform(values))).unwrap()
    }

    fn strict() -> LivenessConfig {
        LivenessConfig {
            thresholds: DecisionThresholds::strict(),
            ..LivenessConfig::default()
        }
    }

    /// Feed `n` passive frames, 33 ms apart, and return the last stage.
    fn run_passive(orch: &mut LivenessOrchestrator, n: usize) -> LivenessStage {
        let mut stage = orch.stage().clone();
        for i in 0..n {
            stage = orch.process_frame(&frame(i, i as u64 * 33), &FaceObservation::default());
        }
        stage
    }

    /// Close for `duration` ms starting at `start`, then reopen.
    fn blink(orch: &mut LivenessOrchestrator, start: u64, duration: u64) -> LivenessStage {
        orch.process_frame(&frame(0, start), &eyes(0.1));
        orch.process_frame(&frame(0, start + duration), &eyes(0.9))
    }

    #[test]
    fn test_first_frame_is_analyzed() {
        let mut orch = orchestrator(LivenessConfig::default(), &[0.7]);
        let stage = run_passive(&mut orch, 1);
        match stage {
            LivenessStage::PassiveAnalysis {
                frame_count,
                total,
                signals,
            } => {
                assert_eq!(frame_count, 1);
                assert_eq!(total, 10);
                assert_relative_eq!(signals.unwrap().final_score, 0.7, epsilon = 1e-9);
            }
            other => panic!("unexpected stage {other:?}"),
        }
    }

    #[test]
    fn test_high_scores_pass_with_score_as_confidence() {
        let mut orch = orchestrator(LivenessConfig::default(), &[0.75]);
        let stage = run_passive(&mut orch, 10);
        let result = stage.result().unwrap();
        assert!(result.passed);
        assert_relative_eq!(result.confidence, 0.75, epsilon = 1e-9);
        assert!(result.attack_type.is_none());
        assert!(result.blink.is_none());
    }

    #[test]
    fn test_nine_frames_do_not_decide() {
        let mut orch = orchestrator(LivenessConfig::default(), &[0.9]);
        let stage = run_passive(&mut orch, 9);
        assert!(matches!(
            stage,
            LivenessStage::PassiveAnalysis { frame_count: 9, .. }
        ));
    }

    #[test]
    fn test_low_scores_fail_with_attack_type() {
        let mut orch = orchestrator(LivenessConfig::default(), &[0.2]);
        let stage = run_passive(&mut orch, 10);
        let result = stage.result().unwrap();
        assert!(!result.passed);
        assert_relative_eq!(result.confidence, 0.8, epsilon = 1e-9);
        assert_eq!(result.attack_type, Some(AttackType::ScreenReplay));
    }

    #[test]
    fn test_median_ignores_single_outlier() {
        let mut values = vec![0.9; 9];
        values.insert(4, 0.0);
        let mut orch = orchestrator(LivenessConfig::default(), &values);
        let result = run_passive(&mut orch, 10).result().cloned().unwrap();
        assert!(result.passed);
        assert_relative_eq!(result.confidence, 0.9, epsilon = 1e-9);
    }

    #[test]
    fn test_history_bounded_by_frame_target() {
        let mut orch = orchestrator(strict(), &[0.75]);
        run_passive(&mut orch, 25);
        assert_eq!(orch.history().len(), 10);
    }

    #[test]
    fn test_uncertain_enters_active_prompt() {
        let mut orch = orchestrator(strict(), &[0.75]);
        let stage = run_passive(&mut orch, 10);
        assert_eq!(
            stage,
            LivenessStage::ActivePrompt {
                blink_count: 0,
                required: 2
            }
        );
    }

    #[test]
    fn test_two_valid_blinks_pass() {
        let mut orch = orchestrator(strict(), &[0.75]);
        run_passive(&mut orch, 10);

        let stage = blink(&mut orch, 1_000, 180);
        assert_eq!(
            stage,
            LivenessStage::ActivePrompt {
                blink_count: 1,
                required: 2
            }
        );

        let stage = blink(&mut orch, 2_000, 220);
        let result = stage.result().unwrap();
        assert!(result.passed);
        assert_relative_eq!(result.confidence, ACTIVE_PASS_CONFIDENCE);
        assert!(result.attack_type.is_none());
        let outcome = result.blink.as_ref().unwrap();
        assert_eq!(outcome.blink_count, 2);
        assert!(outcome.natural);
        assert_eq!(outcome.durations_ms, vec![180.0, 220.0]);
        assert_relative_eq!(result.signals.final_score, 0.75, epsilon = 1e-9);
    }

    #[test]
    fn test_identical_blinks_fail_when_three_required() {
        let config = LivenessConfig {
            required_blinks: 3,
            ..strict()
        };
        let mut orch = orchestrator(config, &[0.75]);
        run_passive(&mut orch, 10);
        blink(&mut orch, 1_000, 200);
        blink(&mut orch, 2_000, 200);
        let stage = blink(&mut orch, 3_000, 200);

        let result = stage.result().unwrap();
        assert!(!result.passed);
        assert_relative_eq!(result.confidence, ACTIVE_FAIL_CONFIDENCE);
        assert!(result.attack_type.is_some());
        assert!(!result.blink.as_ref().unwrap().natural);
    }

    #[test]
    fn test_invalid_blinks_keep_prompting() {
        let mut orch = orchestrator(strict(), &[0.75]);
        run_passive(&mut orch, 10);
        blink(&mut orch, 1_000, 30);
        let stage = blink(&mut orch, 2_000, 900);
        assert_eq!(
            stage,
            LivenessStage::ActivePrompt {
                blink_count: 0,
                required: 2
            }
        );
    }

    #[test]
    fn test_completed_ignores_frames() {
        let mut orch = orchestrator(LivenessConfig::default(), &[0.9]);
        let done = run_passive(&mut orch, 10);
        let after = orch.process_frame(&frame(11, 500), &eyes(0.1));
        assert_eq!(done, after);
    }

    #[test]
    fn test_reset_clears_session() {
        let extractor = ScriptedExtractor::uniform(&[0.75]);
        let resets = extractor.resets.clone();
        let mut orch = LivenessOrchestrator::new(strict(), Box::new(extractor)).unwrap();
        run_passive(&mut orch, 10);
        blink(&mut orch, 1_000, 200);

        orch.reset();
        assert_eq!(orch.stage(), &LivenessStage::Initializing);
        assert!(orch.history().is_empty());
        assert_eq!(resets.load(Ordering::SeqCst), 1);

        let stage = run_passive(&mut orch, 1);
        assert!(matches!(
            stage,
            LivenessStage::PassiveAnalysis { frame_count: 1, .. }
        ));
    }

    /// Counts what the orchestrator reports; shared so the test can read it.
    #[derive(Default)]
    struct LoggerCounts {
        frames: AtomicUsize,
        summaries: AtomicUsize,
        resets: AtomicUsize,
    }

    struct CountingLogger(Arc<LoggerCounts>);

    impl SessionLogger for CountingLogger {
        fn frame_analyzed(&mut self, _: usize, _: usize, _: f64, _: f64) {
            self.0.frames.fetch_add(1, Ordering::SeqCst);
        }

        fn info(&mut self, _message: &str) {}

        fn summary(&self) {
            self.0.summaries.fetch_add(1, Ordering::SeqCst);
        }

        fn reset(&mut self) {
            self.0.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_reset_starts_a_new_logger_session() {
        let counts = Arc::new(LoggerCounts::default());
        let mut orch = orchestrator(LivenessConfig::default(), &[0.9])
            .with_logger(Box::new(CountingLogger(counts.clone())));

        run_passive(&mut orch, 10);
        assert_eq!(counts.frames.load(Ordering::SeqCst), 10);
        assert_eq!(counts.summaries.load(Ordering::SeqCst), 1);
        assert_eq!(counts.resets.load(Ordering::SeqCst), 0);

        orch.reset();
        assert_eq!(counts.resets.load(Ordering::SeqCst), 1);
        run_passive(&mut orch, 3);
        assert_eq!(counts.frames.load(Ordering::SeqCst), 13);
    }

    #[test]
    fn test_face_alignment_waits_for_box() {
        let config = LivenessConfig {
            require_face_box: true,
            ..LivenessConfig::default()
        };
        let mut orch = orchestrator(config, &[0.9]);
        let no_face = FaceObservation::default();
        let with_face = FaceObservation {
            face_box: Some(FaceBox::new(0, 0, 4, 4)),
            ..FaceObservation::default()
        };

        assert_eq!(
            orch.process_frame(&frame(0, 0), &no_face),
            LivenessStage::FaceAlignment
        );
        assert!(matches!(
            orch.process_frame(&frame(1, 33), &with_face),
            LivenessStage::PassiveAnalysis { frame_count: 1, .. }
        ));
        assert!(matches!(
            orch.process_frame(&frame(2, 66), &no_face),
            LivenessStage::PassiveAnalysis { frame_count: 1, .. }
        ));
    }

    #[test]
    fn test_deadline_fails_session() {
        let config = LivenessConfig {
            max_session_ms: Some(1_000),
            ..strict()
        };
        let mut orch = orchestrator(config, &[0.75]);
        run_passive(&mut orch, 10);
        let stage = orch.process_frame(&frame(10, 1_200), &eyes(0.9));

        let result = stage.result().unwrap();
        assert!(!result.passed);
        assert_relative_eq!(result.confidence, 0.25, epsilon = 1e-9);
        assert!(result.attack_type.is_some());
    }

    #[test]
    fn test_abort_without_history_is_neutral_fail() {
        let mut orch = orchestrator(LivenessConfig::default(), &[0.9]);
        let stage = orch.abort();
        let result = stage.result().unwrap();
        assert!(!result.passed);
        assert_relative_eq!(result.confidence, 0.5);
        assert_eq!(result.attack_type, Some(AttackType::Unknown));
    }

    #[test]
    fn test_abort_after_completion_keeps_result() {
        let mut orch = orchestrator(LivenessConfig::default(), &[0.9]);
        let done = run_passive(&mut orch, 10);
        assert_eq!(orch.abort(), done);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = LivenessConfig {
            weights: FusionWeights {
                cnn: 0.9,
                ..FusionWeights::default()
            },
            ..LivenessConfig::default()
        };
        let result = LivenessOrchestrator::new(config, Box::new(ScriptedExtractor::uniform(&[0.5])));
        assert!(matches!(result, Err(ConfigError::WeightSum(_))));
    }
}
