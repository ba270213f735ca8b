//! Face liveness fusion and decision engine.
//!
//! Per-frame signal analyzers feed a weighted fusion scorer; a session
//! orchestrator aggregates passive frames and falls back to blink
//! verification when the passive verdict is inconclusive.

pub mod shared {
    pub mod config;
    pub mod constants;
    pub mod face_box;
    pub mod face_observation;
    pub mod frame;
    pub mod rolling_window;
    pub mod stats;
}

pub mod analysis {
    pub mod domain {
        pub mod color_analyzer;
        pub mod depth_analyzer;
        pub mod frequency_analyzer;
        pub mod motion_analyzer;
        pub mod sharpness_analyzer;
        pub mod signal_analyzer;
        pub mod signal_extractor;
        pub mod texture_analyzer;
    }
    pub mod infrastructure;
}

pub mod scoring {
    pub mod domain {
        pub mod attack_type;
        pub mod cnn_score_adapter;
        pub mod frame_signals;
        pub mod fusion_scorer;
        pub mod liveness_scorer;
    }
    pub mod infrastructure;
}

pub mod verification {
    pub mod domain {
        pub mod blink_verifier;
    }
}

pub mod pipeline {
    pub mod infrastructure;
    pub mod liveness_orchestrator;
    pub mod liveness_stage;
    pub mod session_logger;
}
