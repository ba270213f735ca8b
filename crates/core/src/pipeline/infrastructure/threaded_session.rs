use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::pipeline::liveness_orchestrator::LivenessOrchestrator;
use crate::pipeline::liveness_stage::LivenessStage;
use crate::shared::face_observation::FaceObservation;
use crate::shared::frame::Frame;

enum Command {
    Frame(Box<Frame>, FaceObservation),
    Reset,
    Abort,
}

/// Runs one orchestrator on a dedicated worker thread.
///
/// At most one frame is in flight: a frame submitted while the worker is
/// still busy is dropped rather than queued, so a slow analyzer never
/// builds up latency. Control commands (reset, abort) are always queued.
/// Every stage the worker produces is published on [`stages`](Self::stages).
pub struct ThreadedLivenessSession {
    commands: Option<Sender<Command>>,
    stages: Receiver<LivenessStage>,
    busy: Arc<AtomicBool>,
    latest: Arc<Mutex<LivenessStage>>,
    handle: Option<JoinHandle<LivenessOrchestrator>>,
}

impl ThreadedLivenessSession {
    pub fn spawn(orchestrator: LivenessOrchestrator) -> Self {
        let (command_tx, command_rx) = crossbeam_channel::unbounded::<Command>();
        let (stage_tx, stage_rx) = crossbeam_channel::unbounded::<LivenessStage>();
        let busy = Arc::new(AtomicBool::new(false));
        let latest = Arc::new(Mutex::new(orchestrator.stage().clone()));

        let handle = spawn_worker(
            orchestrator,
            command_rx,
            stage_tx,
            busy.clone(),
            latest.clone(),
        );

        Self {
            commands: Some(command_tx),
            stages: stage_rx,
            busy,
            latest,
            handle: Some(handle),
        }
    }

    /// Hand a frame to the worker. Returns `false` if it was dropped
    /// because another frame is still being processed.
    pub fn submit(&self, frame: Frame, observation: FaceObservation) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("dropping frame {}: session busy", frame.index());
            return false;
        }
        let frame_index = frame.index();
        if !self.send(Command::Frame(Box::new(frame), observation)) {
            log::warn!("dropping frame {}: session worker is gone", frame_index);
            self.busy.store(false, Ordering::Release);
            return false;
        }
        true
    }

    pub fn reset(&self) {
        self.send(Command::Reset);
    }

    pub fn abort(&self) {
        self.send(Command::Abort);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Stream of stages, one per processed command.
    pub fn stages(&self) -> &Receiver<LivenessStage> {
        &self.stages
    }

    pub fn latest_stage(&self) -> LivenessStage {
        self.latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Stop the worker once queued commands drain and take back the
    /// orchestrator.
    pub fn shutdown(mut self) -> Result<LivenessOrchestrator, Box<dyn std::error::Error>> {
        self.commands.take();
        let handle = self
            .handle
            .take()
            .ok_or("session worker already stopped")?;
        handle
            .join()
            .map_err(|_| "session worker panicked".into())
    }

    fn send(&self, command: Command) -> bool {
        match &self.commands {
            Some(tx) => tx.send(command).is_ok(),
            None => false,
        }
    }
}

impl Drop for ThreadedLivenessSession {
    fn drop(&mut self) {
        self.commands.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("session worker panicked");
            }
        }
    }
}

fn spawn_worker(
    mut orchestrator: LivenessOrchestrator,
    command_rx: Receiver<Command>,
    stage_tx: Sender<LivenessStage>,
    busy: Arc<AtomicBool>,
    latest: Arc<Mutex<LivenessStage>>,
) -> JoinHandle<LivenessOrchestrator> {
    std::thread::spawn(move || {
        for command in command_rx {
            let stage = match command {
                Command::Frame(frame, observation) => {
                    let _in_flight = InFlight(&busy);
                    let stage = orchestrator.process_frame(&frame, &observation);
                    publish_latest(&latest, &stage);
                    stage
                }
                Command::Reset => {
                    orchestrator.reset();
                    let stage = orchestrator.stage().clone();
                    publish_latest(&latest, &stage);
                    stage
                }
                Command::Abort => {
                    let stage = orchestrator.abort();
                    publish_latest(&latest, &stage);
                    stage
                }
            };
            // Nobody listening is fine; `latest_stage` still has it.
            let _ = stage_tx.send(stage);
        }
        orchestrator
    })
}

/// Clears the busy flag when the frame is done, including when the
/// orchestrator panics mid-frame.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn publish_latest(latest: &Mutex<LivenessStage>, stage: &LivenessStage) {
    *latest.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = stage.clone();
}
