use serde::{Deserialize, Serialize};

/// Presentation-attack category inferred from a failing score pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttackType {
    PrintedPhoto,
    ScreenReplay,
    #[serde(rename = "MASK_2D")]
    Mask2d,
    #[serde(rename = "MASK_3D")]
    Mask3d,
    VideoReplay,
    Deepfake,
    Unknown,
}

impl AttackType {
    pub const ALL: &[AttackType] = &[
        AttackType::PrintedPhoto,
        AttackType::ScreenReplay,
        AttackType::Mask2d,
        AttackType::Mask3d,
        AttackType::VideoReplay,
        AttackType::Deepfake,
        AttackType::Unknown,
    ];
}

impl std::fmt::Display for AttackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttackType::PrintedPhoto => write!(f, "Printed photo"),
            AttackType::ScreenReplay => write!(f, "Screen replay"),
            AttackType::Mask2d => write!(f, "2D mask"),
            AttackType::Mask3d => write!(f, "3D mask"),
            AttackType::VideoReplay => write!(f, "Video replay"),
            AttackType::Deepfake => write!(f, "Deepfake"),
            AttackType::Unknown => write!(f, "Unknown"),
        }
    }
}
