use std::time::Instant;

/// Observer for liveness session events.
///
/// The orchestrator reports what happened; embedders decide how (and
/// whether) it is surfaced.
pub trait SessionLogger: Send {
    /// One passive frame was analyzed and fused.
    fn frame_analyzed(&mut self, frame_count: usize, total: usize, final_score: f64, elapsed_ms: f64);

    /// Stage transitions and other notable session events.
    fn info(&mut self, message: &str);

    /// Called once when the session reaches a verdict. Default: no-op.
    fn summary(&self) {}

    /// Called when the orchestrator starts a new session. Default: no-op.
    fn reset(&mut self) {}
}

/// Discards all events.
pub struct NullSessionLogger;

impl SessionLogger for NullSessionLogger {
    fn frame_analyzed(&mut self, _: usize, _: usize, _: f64, _: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Writes session events to the `log` facade and summarizes the session
/// once a verdict is reached.
///
/// Progress is logged every `progress_every` frames and on the last
/// passive frame.
pub struct LogSessionLogger {
    progress_every: usize,
    started: Option<Instant>,
    analysis_ms: Vec<f64>,
    final_scores: Vec<f64>,
    events: Vec<String>,
}

impl LogSessionLogger {
    pub fn new(progress_every: usize) -> Self {
        Self {
            progress_every: progress_every.max(1),
            started: None,
            analysis_ms: Vec::new(),
            final_scores: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Per-frame analysis times of the current session.
    pub fn analysis_ms(&self) -> &[f64] {
        &self.analysis_ms
    }

    /// Fused per-frame scores of the current session, in arrival order.
    pub fn final_scores(&self) -> &[f64] {
        &self.final_scores
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// Session summary, or `None` before any frame was analyzed.
    pub fn summary_string(&self) -> Option<String> {
        let (lo, hi) = min_max(&self.final_scores)?;
        let wall_ms = self
            .started
            .map_or(0.0, |t| t.elapsed().as_secs_f64() * 1000.0);
        let slowest = min_max(&self.analysis_ms).map_or(0.0, |(_, hi)| hi);

        let mut summary = format!(
            "Session summary: {} frames over {wall_ms:.0}ms\n  analysis: avg {:.1}ms  slowest {slowest:.1}ms\n  final score: avg {:.3}  min {lo:.3}  max {hi:.3}",
            self.final_scores.len(),
            mean(&self.analysis_ms),
            mean(&self.final_scores),
        );
        if !self.events.is_empty() {
            summary.push_str(&format!("\n  events: {}", self.events.join("; ")));
        }
        Some(summary)
    }
}

impl Default for LogSessionLogger {
    fn default() -> Self {
        Self::new(5)
    }
}

impl SessionLogger for LogSessionLogger {
    fn frame_analyzed(&mut self, frame_count: usize, total: usize, final_score: f64, elapsed_ms: f64) {
        self.started.get_or_insert_with(Instant::now);
        self.analysis_ms.push(elapsed_ms);
        self.final_scores.push(final_score);
        if frame_count % self.progress_every == 0 || frame_count == total {
            log::info!("Passive analysis: {frame_count}/{total} frames (score {final_score:.3})");
        } else {
            log::debug!("Frame {frame_count}: score {final_score:.3} in {elapsed_ms:.1}ms");
        }
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
        self.events.push(message.to_string());
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("{text}");
        }
    }

    fn reset(&mut self) {
        self.started = None;
        self.analysis_ms.clear();
        self.final_scores.clear();
        self.events.clear();
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_logger_ignores_everything() {
        let mut logger = NullSessionLogger;
        logger.frame_analyzed(1, 10, 0.7, 4.0);
        logger.info("stage Initializing -> PassiveAnalysis");
        logger.summary();
        logger.reset();
    }

    #[test]
    fn test_records_scores_in_arrival_order() {
        let mut logger = LogSessionLogger::new(5);
        logger.frame_analyzed(1, 3, 0.5, 20.0);
        logger.frame_analyzed(2, 3, 0.7, 30.0);
        assert_eq!(logger.final_scores(), &[0.5, 0.7]);
        assert_eq!(logger.analysis_ms(), &[20.0, 30.0]);
    }

    #[test]
    fn test_summary_reports_score_range_and_events() {
        let mut logger = LogSessionLogger::new(5);
        logger.frame_analyzed(1, 2, 0.5, 12.0);
        logger.frame_analyzed(2, 2, 0.7, 8.0);
        logger.info("passive score 0.600 inconclusive, requesting blinks");

        let summary = logger.summary_string().unwrap();
        assert!(summary.starts_with("Session summary: 2 frames"));
        assert!(summary.contains("avg 10.0ms  slowest 12.0ms"));
        assert!(summary.contains("final score: avg 0.600  min 0.500  max 0.700"));
        assert!(summary.contains("inconclusive"));
    }

    #[test]
    fn test_no_summary_before_first_frame() {
        let mut logger = LogSessionLogger::default();
        logger.info("session aborted by caller");
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_reset_starts_a_fresh_session() {
        let mut logger = LogSessionLogger::default();
        logger.frame_analyzed(1, 10, 0.2, 3.0);
        logger.info("stage Initializing -> PassiveAnalysis");

        logger.reset();
        assert!(logger.final_scores().is_empty());
        assert!(logger.analysis_ms().is_empty());
        assert!(logger.events().is_empty());
        assert!(logger.summary_string().is_none());

        logger.frame_analyzed(1, 10, 0.9, 3.0);
        assert_eq!(logger.final_scores(), &[0.9]);
    }
}
