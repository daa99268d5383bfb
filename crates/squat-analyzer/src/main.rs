//! Squat Analyzer - Main Entry Point

use anyhow::Context;
use clap::Parser;
use squat_analyzer::{init_logging, read_frames, spawn_analysis, AnalyzerError, Cli};
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Frames buffered between the reader and the worker
const FRAME_QUEUE: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json).context("Failed to set tracing subscriber")?;

    info!("=== Squat Analyzer v{} ===", env!("CARGO_PKG_VERSION"));

    let thresholds = cli.load_thresholds()?;
    info!("Using {} thresholds", cli.difficulty);

    let input: Box<dyn AsyncRead + Unpin + Send> = if cli.reads_stdin() {
        Box::new(tokio::io::stdin())
    } else {
        let file = tokio::fs::File::open(&cli.input)
            .await
            .with_context(|| format!("Failed to open {}", cli.input.display()))?;
        Box::new(file)
    };

    let (frames_tx, frames_rx) = mpsc::channel(FRAME_QUEUE);
    let handle = spawn_analysis(thresholds, frames_rx, cli.analysis_options());

    let mut progress = handle.progress;
    let progress_task = tokio::spawn(async move {
        while let Some(update) = progress.recv().await {
            debug!(
                "{} frames analysed, phase {}, {} reps ({} improper)",
                update.frames_processed, update.phase, update.reps, update.improper_reps
            );
        }
    });

    let stats = read_frames(input, cli.fps, frames_tx).await?;
    let report = handle.result.await.map_err(|_| AnalyzerError::WorkerGone)?;
    progress_task.await?;

    info!(
        "{} reps ({} improper, {:.0}% proper form, {} shallow attempts) over {} frames, {} malformed lines",
        report.summary.total_reps,
        report.summary.improper_reps,
        report.summary.proper_ratio() * 100.0,
        report.shallow_attempts,
        report.frames_processed,
        stats.malformed
    );

    println!("{}", serde_json::to_string_pretty(&report.summary)?);
    Ok(())
}
