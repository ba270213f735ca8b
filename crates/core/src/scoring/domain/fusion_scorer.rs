//! Weighted fusion of per-signal scores, the PASS/FAIL/UNCERTAIN decision,
//! and attack-type inference from a failing score pattern.

use serde::{Deserialize, Serialize};

use crate::scoring::domain::attack_type::AttackType;
use crate::scoring::domain::frame_signals::{ComponentScores, FrameSignals};
use crate::shared::config::ConfigError;

/// Allowed deviation of the weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Slack on both decision boundaries. A weighted sum of components that all
/// sit on a threshold can land a few ulps off it.
pub const DECISION_TOLERANCE: f64 = 1e-9;

/// Per-signal weights of the fused score. Must sum to 1.0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    pub cnn: f64,
    pub frequency: f64,
    pub texture: f64,
    pub motion: f64,
    pub depth: f64,
    pub color: f64,
    pub sharpness: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            cnn: 0.40,
            frequency: 0.15,
            texture: 0.12,
            motion: 0.10,
            depth: 0.10,
            color: 0.08,
            sharpness: 0.05,
        }
    }
}

impl FusionWeights {
    fn as_array(&self) -> [f64; 7] {
        [
            self.cnn,
            self.frequency,
            self.texture,
            self.motion,
            self.depth,
            self.color,
            self.sharpness,
        ]
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(&w) = self
            .as_array()
            .iter()
            .find(|w| !w.is_finite() || **w < 0.0 || **w > 1.0)
        {
            return Err(ConfigError::WeightOutOfRange(w));
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum(sum));
        }
        Ok(())
    }
}

/// Inclusive decision boundaries on the fused score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionThresholds {
    pub pass: f64,
    pub fail: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            pass: 0.60,
            fail: 0.40,
        }
    }
}

impl DecisionThresholds {
    /// Tighter calibration: more sessions fall through to blink verification.
    pub fn strict() -> Self {
        Self {
            pass: 0.85,
            fail: 0.55,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = 0.0 <= self.fail && self.fail < self.pass && self.pass <= 1.0;
        if !ordered {
            return Err(ConfigError::Thresholds {
                pass: self.pass,
                fail: self.fail,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Pass,
    Fail,
    Uncertain,
}

/// Pure scorer: never fails once constructed.
#[derive(Clone, Debug)]
pub struct FusionScorer {
    weights: FusionWeights,
    thresholds: DecisionThresholds,
}

impl FusionScorer {
    pub fn new(weights: FusionWeights, thresholds: DecisionThresholds) -> Result<Self, ConfigError> {
        weights.validate()?;
        thresholds.validate()?;
        Ok(Self {
            weights,
            thresholds,
        })
    }

    pub fn weights(&self) -> &FusionWeights {
        &self.weights
    }

    pub fn thresholds(&self) -> &DecisionThresholds {
        &self.thresholds
    }

    /// Clamp the components and compute the weighted final score.
    pub fn fuse(&self, scores: ComponentScores) -> FrameSignals {
        let s = scores.clamped();
        let w = &self.weights;
        let final_score = w.cnn * s.cnn
            + w.frequency * s.frequency
            + w.texture * s.texture
            + w.motion * s.motion
            + w.depth * s.depth
            + w.color * s.color
            + w.sharpness * s.sharpness;
        FrameSignals::new(s, final_score.clamp(0.0, 1.0))
    }

    /// Both boundaries are inclusive.
    pub fn decide(&self, final_score: f64) -> Decision {
        if final_score >= self.thresholds.pass - DECISION_TOLERANCE {
            Decision::Pass
        } else if final_score <= self.thresholds.fail + DECISION_TOLERANCE {
            Decision::Fail
        } else {
            Decision::Uncertain
        }
    }
}

impl Default for FusionScorer {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            thresholds: DecisionThresholds::default(),
        }
    }
}

/// Classify the most likely attack from aggregated scores.
///
/// Rules are checked in priority order; the first match wins.
pub fn infer_attack_type(signals: &FrameSignals) -> AttackType {
    if signals.cnn < 0.3 {
        if signals.frequency < 0.5 {
            return AttackType::ScreenReplay;
        }
        return AttackType::PrintedPhoto;
    }
    if signals.frequency < 0.4 {
        return AttackType::ScreenReplay;
    }
    if signals.texture < 0.4 && signals.motion < 0.4 {
        return AttackType::PrintedPhoto;
    }
    if signals.depth < 0.35 {
        return AttackType::Mask2d;
    }
    if signals.motion < 0.4 {
        return AttackType::VideoReplay;
    }
    if signals.color < 0.45 && signals.sharpness < 0.45 {
        return AttackType::Mask3d;
    }
    AttackType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn scores(
        cnn: f64,
        frequency: f64,
        texture: f64,
        motion: f64,
        depth: f64,
        color: f64,
        sharpness: f64,
    ) -> FrameSignals {
        FrameSignals::new(
            ComponentScores {
                cnn,
                texture,
                frequency,
                color,
                sharpness,
                motion,
                depth,
            },
            0.0,
        )
    }

    // ── Weights ───────────────────────────────────────────────────────

    #[test]
    fn test_default_weights_sum_to_one() {
        assert_relative_eq!(FusionWeights::default().sum(), 1.0, epsilon = WEIGHT_SUM_TOLERANCE);
        assert!(FusionWeights::default().validate().is_ok());
    }

    #[test]
    fn test_weights_not_summing_to_one_rejected() {
        let weights = FusionWeights {
            cnn: 0.35,
            ..FusionWeights::default()
        };
        let err = FusionScorer::new(weights, DecisionThresholds::default()).unwrap_err();
        assert!(matches!(err, ConfigError::WeightSum(_)));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let weights = FusionWeights {
            cnn: 0.50,
            sharpness: -0.05,
            ..FusionWeights::default()
        };
        assert!(matches!(
            weights.validate(),
            Err(ConfigError::WeightOutOfRange(_))
        ));
    }

    #[rstest]
    #[case::inverted(0.4, 0.6)]
    #[case::equal(0.5, 0.5)]
    #[case::pass_above_one(1.2, 0.4)]
    #[case::fail_below_zero(0.6, -0.1)]
    fn test_invalid_thresholds_rejected(#[case] pass: f64, #[case] fail: f64) {
        let thresholds = DecisionThresholds { pass, fail };
        assert!(FusionScorer::new(FusionWeights::default(), thresholds).is_err());
    }

    // ── Fusion ────────────────────────────────────────────────────────

    #[test]
    fn test_uniform_scores_fuse_to_same_value() {
        let scorer = FusionScorer::default();
        let signals = scorer.fuse(ComponentScores::uniform(0.75));
        assert_relative_eq!(signals.final_score, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_fuse_applies_weights() {
        let scorer = FusionScorer::default();
        let signals = scorer.fuse(ComponentScores {
            cnn: 1.0,
            ..ComponentScores::uniform(0.0)
        });
        assert_relative_eq!(signals.final_score, 0.40);

        let signals = scorer.fuse(ComponentScores {
            frequency: 1.0,
            sharpness: 1.0,
            ..ComponentScores::uniform(0.0)
        });
        assert_relative_eq!(signals.final_score, 0.20, epsilon = 1e-12);
    }

    #[test]
    fn test_fuse_clamps_components() {
        let scorer = FusionScorer::default();
        let signals = scorer.fuse(ComponentScores::uniform(3.0));
        assert_relative_eq!(signals.cnn, 1.0);
        assert!(signals.final_score <= 1.0);
    }

    // ── Decision ──────────────────────────────────────────────────────

    #[rstest]
    #[case::pass_boundary(0.60, Decision::Pass)]
    #[case::fail_boundary(0.40, Decision::Fail)]
    #[case::just_below_pass(0.5999, Decision::Uncertain)]
    #[case::just_above_fail(0.4001, Decision::Uncertain)]
    #[case::high(0.95, Decision::Pass)]
    #[case::zero(0.0, Decision::Fail)]
    fn test_decide(#[case] score: f64, #[case] expected: Decision) {
        assert_eq!(FusionScorer::default().decide(score), expected);
    }

    #[rstest]
    #[case::on_fail_threshold(0.40, Decision::Fail)]
    #[case::on_pass_threshold(0.60, Decision::Pass)]
    #[case::between(0.50, Decision::Uncertain)]
    fn test_fused_uniform_scores_respect_inclusive_boundaries(
        #[case] value: f64,
        #[case] expected: Decision,
    ) {
        let scorer = FusionScorer::default();
        let fused = scorer.fuse(ComponentScores::uniform(value));
        assert_eq!(scorer.decide(fused.final_score), expected);
    }

    #[test]
    fn test_decide_monotonic_above_pass() {
        let scorer = FusionScorer::default();
        let mut score = 0.60;
        while score <= 1.0 {
            assert_eq!(scorer.decide(score), Decision::Pass);
            score += 0.001;
        }
    }

    #[test]
    fn test_strict_thresholds() {
        let scorer =
            FusionScorer::new(FusionWeights::default(), DecisionThresholds::strict()).unwrap();
        assert_eq!(scorer.decide(0.75), Decision::Uncertain);
        assert_eq!(scorer.decide(0.90), Decision::Pass);
        assert_eq!(scorer.decide(0.55), Decision::Fail);
    }

    // ── Attack inference ──────────────────────────────────────────────

    #[rstest]
    #[case::low_cnn_low_frequency(scores(0.2, 0.3, 0.9, 0.9, 0.9, 0.9, 0.9), AttackType::ScreenReplay)]
    #[case::low_cnn_high_frequency(scores(0.2, 0.8, 0.9, 0.9, 0.9, 0.9, 0.9), AttackType::PrintedPhoto)]
    #[case::low_frequency(scores(0.5, 0.35, 0.9, 0.9, 0.9, 0.9, 0.9), AttackType::ScreenReplay)]
    #[case::flat_and_still(scores(0.5, 0.6, 0.3, 0.3, 0.9, 0.9, 0.9), AttackType::PrintedPhoto)]
    #[case::no_depth(scores(0.5, 0.6, 0.9, 0.9, 0.3, 0.9, 0.9), AttackType::Mask2d)]
    #[case::still_only(scores(0.5, 0.6, 0.9, 0.3, 0.9, 0.9, 0.9), AttackType::VideoReplay)]
    #[case::dull_and_soft(scores(0.5, 0.6, 0.9, 0.9, 0.9, 0.4, 0.4), AttackType::Mask3d)]
    #[case::nothing_stands_out(scores(0.5, 0.6, 0.9, 0.9, 0.9, 0.9, 0.9), AttackType::Unknown)]
    #[case::depth_beats_motion(scores(0.5, 0.6, 0.9, 0.3, 0.3, 0.9, 0.9), AttackType::Mask2d)]
    fn test_infer_attack_type(#[case] signals: FrameSignals, #[case] expected: AttackType) {
        assert_eq!(infer_attack_type(&signals), expected);
    }

    #[test]
    fn test_neutral_signals_are_unknown() {
        assert_eq!(infer_attack_type(&FrameSignals::neutral()), AttackType::Unknown);
    }

    proptest! {
        #[test]
        fn prop_fused_score_in_unit_range(c in prop::array::uniform7(-1.0f64..2.0)) {
            let signals = FusionScorer::default().fuse(ComponentScores {
                cnn: c[0],
                texture: c[1],
                frequency: c[2],
                color: c[3],
                sharpness: c[4],
                motion: c[5],
                depth: c[6],
            });
            prop_assert!((0.0..=1.0).contains(&signals.final_score));
        }
    }
}
