use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::domain::fusion_scorer::{DecisionThresholds, FusionWeights};
use crate::shared::constants::{
    DEFAULT_DEPTH_HISTORY, DEFAULT_MOTION_HISTORY, DEFAULT_REQUIRED_BLINKS,
    DEFAULT_REQUIRED_PASSIVE_FRAMES,
};
use crate::verification::domain::blink_verifier::BlinkConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("fusion weights must sum to 1.0, got {0}")]
    WeightSum(f64),
    #[error("fusion weight {0} is outside [0, 1]")]
    WeightOutOfRange(f64),
    #[error("thresholds must satisfy 0 <= fail < pass <= 1 (pass={pass}, fail={fail})")]
    Thresholds { pass: f64, fail: f64 },
    #[error("{0} must be at least 1")]
    Zero(&'static str),
    #[error("invalid blink configuration: {0}")]
    Blink(&'static str),
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Tunable parameters of one detection session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    pub required_passive_frames: usize,
    pub required_blinks: usize,
    pub thresholds: DecisionThresholds,
    pub weights: FusionWeights,
    pub motion_history: usize,
    pub depth_history: usize,
    pub blink: BlinkConfig,
    /// Fan the stateless analyzers out across scoped threads per frame.
    pub parallel_analysis: bool,
    /// Hold the session in face alignment until the detector reports a box.
    pub require_face_box: bool,
    /// Fail the session once this much frame time has elapsed. Must be
    /// non-zero when set.
    pub max_session_ms: Option<u64>,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            required_passive_frames: DEFAULT_REQUIRED_PASSIVE_FRAMES,
            required_blinks: DEFAULT_REQUIRED_BLINKS,
            thresholds: DecisionThresholds::default(),
            weights: FusionWeights::default(),
            motion_history: DEFAULT_MOTION_HISTORY,
            depth_history: DEFAULT_DEPTH_HISTORY,
            blink: BlinkConfig::default(),
            parallel_analysis: false,
            require_face_box: false,
            max_session_ms: None,
        }
    }
}

impl LivenessConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.thresholds.validate()?;
        self.blink.validate()?;
        if self.required_passive_frames == 0 {
            return Err(ConfigError::Zero("required_passive_frames"));
        }
        if self.required_blinks == 0 {
            return Err(ConfigError::Zero("required_blinks"));
        }
        if self.motion_history == 0 {
            return Err(ConfigError::Zero("motion_history"));
        }
        if self.depth_history == 0 {
            return Err(ConfigError::Zero("depth_history"));
        }
        if self.max_session_ms == Some(0) {
            return Err(ConfigError::Zero("max_session_ms"));
        }
        Ok(())
    }
}
