/// Score every signal falls back to when it cannot be computed.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Passive frames aggregated before a decision.
pub const DEFAULT_REQUIRED_PASSIVE_FRAMES: usize = 10;

/// Blinks required to complete active verification.
pub const DEFAULT_REQUIRED_BLINKS: usize = 2;

pub const DEFAULT_MOTION_HISTORY: usize = 10;
pub const DEFAULT_DEPTH_HISTORY: usize = 20;

/// Confidence reported when active verification passes / fails.
pub const ACTIVE_PASS_CONFIDENCE: f64 = 0.90;
pub const ACTIVE_FAIL_CONFIDENCE: f64 = 0.85;

/// Face-crop scale factors fed to the anti-spoof CNN.
pub const CNN_SCALE_FACTORS: &[f64] = &[2.7, 4.0];
pub const CNN_INPUT_SIZE: usize = 80;
