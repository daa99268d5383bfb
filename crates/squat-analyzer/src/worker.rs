//! Background analysis worker
//!
//! One worker drives one fresh `SquatSession`. Frames arrive over an mpsc
//! channel; progress leaves through a bounded channel with `try_send` so a
//! slow consumer never stalls analysis; the final report is delivered once
//! over a oneshot channel.

use pose_landmarks::FrameLandmarks;
use serde::{Deserialize, Serialize};
use squat_engine::{Rep, SessionOutcome, ShallowRepPolicy, SquatPhase, SquatSession};
use squat_thresholds::Thresholds;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use workout_summary::WorkoutSummary;

/// Worker configuration
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Capacity of the progress channel
    pub progress_capacity: usize,
    /// Emit progress every N frames
    pub progress_interval: u64,
    /// Handling of attempts that never reach full depth
    pub shallow_policy: ShallowRepPolicy,
    /// Expected frame count, when known up front
    pub total_frames: Option<u64>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            progress_capacity: 16,
            progress_interval: 15,
            shallow_policy: ShallowRepPolicy::Discard,
            total_frames: None,
        }
    }
}

/// Progress notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub frames_processed: u64,
    pub total_frames: Option<u64>,
    pub phase: SquatPhase,
    pub reps: usize,
    pub improper_reps: usize,
}

impl Progress {
    /// Completion percentage when the total is known
    pub fn percent(&self) -> Option<f64> {
        self.total_frames
            .filter(|total| *total > 0)
            .map(|total| (self.frames_processed as f64 / total as f64 * 100.0).min(100.0))
    }
}

/// Final result of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary: WorkoutSummary,
    pub reps: Vec<Rep>,
    pub shallow_attempts: u32,
    pub frames_processed: u64,
    pub invalid_frames: u64,
}

impl From<SessionOutcome> for AnalysisReport {
    fn from(outcome: SessionOutcome) -> Self {
        Self {
            summary: WorkoutSummary::from_reps(&outcome.reps),
            reps: outcome.reps,
            shallow_attempts: outcome.shallow_attempts,
            frames_processed: outcome.frames_processed,
            invalid_frames: outcome.invalid_frames,
        }
    }
}

/// Channels and task of a running worker.
///
/// Dropping `result` abandons the worker at its next frame.
pub struct AnalysisHandle {
    pub progress: mpsc::Receiver<Progress>,
    pub result: oneshot::Receiver<AnalysisReport>,
    pub worker: JoinHandle<()>,
}

/// Start analysing `frames` on a background task
pub fn spawn_analysis(
    thresholds: Thresholds,
    frames: mpsc::Receiver<FrameLandmarks>,
    options: AnalysisOptions,
) -> AnalysisHandle {
    let (progress_tx, progress) = mpsc::channel(options.progress_capacity.max(1));
    let (result_tx, result) = oneshot::channel();

    let worker = tokio::spawn(run_worker(thresholds, frames, options, progress_tx, result_tx));

    AnalysisHandle {
        progress,
        result,
        worker,
    }
}

async fn run_worker(
    thresholds: Thresholds,
    mut frames: mpsc::Receiver<FrameLandmarks>,
    options: AnalysisOptions,
    progress_tx: mpsc::Sender<Progress>,
    mut result_tx: oneshot::Sender<AnalysisReport>,
) {
    let mut session = SquatSession::with_policy(&thresholds, options.shallow_policy);
    let interval = options.progress_interval.max(1);
    info!("Analysis worker started");

    loop {
        let frame = tokio::select! {
            biased;
            _ = result_tx.closed() => {
                info!(
                    "Result receiver dropped, abandoning analysis after {} frames",
                    session.frames_processed()
                );
                return;
            }
            frame = frames.recv() => frame,
        };
        let Some(frame) = frame else {
            break;
        };

        let analysis = session.process(&frame);
        for event in &analysis.events {
            debug!("Frame {}: {:?}", analysis.frame_index, event);
        }

        if session.frames_processed() % interval == 0 {
            let update = Progress {
                frames_processed: session.frames_processed(),
                total_frames: options.total_frames,
                phase: analysis.phase,
                reps: analysis.total_reps,
                improper_reps: analysis.improper_reps,
            };
            // Non-blocking; lagging consumers miss updates
            let _ = progress_tx.try_send(update);
        }
    }

    let report = AnalysisReport::from(session.finish());
    if result_tx.send(report).is_err() {
        warn!("Result receiver dropped before the report was delivered");
    }
}
