//! Active liveness check: count natural blinks from per-frame eye-openness.
//!
//! A blink is one EyesOpen -> EyesClosed -> EyesOpen cycle whose closed
//! phase lasts between `min_duration_ms` and `max_duration_ms`. Openness
//! between the two thresholds never causes a transition.

use serde::{Deserialize, Serialize};

use crate::shared::config::ConfigError;
use crate::shared::stats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// Openness below this closes the eyes.
    pub closed_threshold: f64,
    /// Openness above this reopens them.
    pub open_threshold: f64,
    pub min_duration_ms: u64,
    pub max_duration_ms: u64,
    /// Accepted standard deviation window of blink durations.
    pub min_timing_std_ms: f64,
    pub max_timing_std_ms: f64,
    /// Fewer recorded blinks than this are always considered natural.
    pub min_blinks_for_naturalness: usize,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            closed_threshold: 0.30,
            open_threshold: 0.70,
            min_duration_ms: 50,
            max_duration_ms: 500,
            min_timing_std_ms: 5.0,
            max_timing_std_ms: 200.0,
            min_blinks_for_naturalness: 3,
        }
    }
}

impl BlinkConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let thresholds_ordered = 0.0 <= self.closed_threshold
            && self.closed_threshold < self.open_threshold
            && self.open_threshold <= 1.0;
        if !thresholds_ordered {
            return Err(ConfigError::Blink(
                "openness thresholds must satisfy 0 <= closed < open <= 1",
            ));
        }
        if self.min_duration_ms > self.max_duration_ms {
            return Err(ConfigError::Blink("min_duration_ms exceeds max_duration_ms"));
        }
        let std_ordered = self.min_timing_std_ms.is_finite()
            && self.max_timing_std_ms.is_finite()
            && 0.0 <= self.min_timing_std_ms
            && self.min_timing_std_ms <= self.max_timing_std_ms;
        if !std_ordered {
            return Err(ConfigError::Blink("timing std window is inverted or negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeState {
    Open,
    Closed { since_ms: u64 },
}

pub struct BlinkVerifier {
    config: BlinkConfig,
    state: EyeState,
    blink_count: usize,
    durations_ms: Vec<f64>,
}

impl BlinkVerifier {
    pub fn new(config: BlinkConfig) -> Self {
        Self {
            config,
            state: EyeState::Open,
            blink_count: 0,
            durations_ms: Vec::new(),
        }
    }

    /// Feed one frame's eye openness. Returns true when this frame
    /// completed a valid blink.
    pub fn update(&mut self, openness: f64, timestamp_ms: u64) -> bool {
        match self.state {
            EyeState::Open if openness < self.config.closed_threshold => {
                self.state = EyeState::Closed {
                    since_ms: timestamp_ms,
                };
                false
            }
            EyeState::Closed { since_ms } if openness > self.config.open_threshold => {
                self.state = EyeState::Open;
                let duration = timestamp_ms.saturating_sub(since_ms);
                if (self.config.min_duration_ms..=self.config.max_duration_ms).contains(&duration) {
                    self.blink_count += 1;
                    self.durations_ms.push(duration as f64);
                    log::debug!("blink {} accepted ({duration} ms)", self.blink_count);
                    true
                } else {
                    log::debug!("eye closure of {duration} ms discarded");
                    false
                }
            }
            _ => false,
        }
    }

    pub fn state(&self) -> EyeState {
        self.state
    }

    pub fn blink_count(&self) -> usize {
        self.blink_count
    }

    pub fn durations_ms(&self) -> &[f64] {
        &self.durations_ms
    }

    pub fn is_complete(&self, required: usize) -> bool {
        self.blink_count >= required
    }

    /// Identical timings across many blinks point at a looped video.
    pub fn is_natural(&self) -> bool {
        if self.durations_ms.len() < self.config.min_blinks_for_naturalness {
            return true;
        }
        let std = stats::std_dev(&self.durations_ms);
        (self.config.min_timing_std_ms..=self.config.max_timing_std_ms).contains(&std)
    }

    pub fn reset(&mut self) {
        self.state = EyeState::Open;
        self.blink_count = 0;
        self.durations_ms.clear();
    }
}

impl Default for BlinkVerifier {
    fn default() -> Self {
        Self::new(BlinkConfig::default())
    }
}
