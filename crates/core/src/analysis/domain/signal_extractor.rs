use crate::scoring::domain::frame_signals::ComponentScores;
use crate::shared::face_observation::FaceObservation;
use crate::shared::frame::Frame;

/// Domain interface producing every per-frame signal score.
///
/// Implementations own whatever temporal state their analyzers need and
/// must never fail: a signal that cannot be computed is reported neutral.
pub trait SignalExtractor: Send {
    fn extract(&mut self, frame: &Frame, observation: &FaceObservation) -> ComponentScores;

    /// Drop all temporal state ahead of a new session.
    fn reset(&mut self);
}
