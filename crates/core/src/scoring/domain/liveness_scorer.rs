use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Domain interface for the external anti-spoofing model.
///
/// Returns the probability that the face inside `face_box` is a real face.
/// Implementations may be stateful (session handles, caches), hence
/// `&mut self`.
pub trait LivenessScorer: Send {
    fn score(&mut self, frame: &Frame, face_box: &FaceBox)
        -> Result<f64, Box<dyn std::error::Error>>;
}
