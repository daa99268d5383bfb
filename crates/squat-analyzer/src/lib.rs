//! Squat Analyzer
//!
//! Runs squat analysis over a recorded landmark stream on a background
//! worker and reports the workout summary.
//!
//! # Usage
//!
//! ```bash
//! # Analyse a JSON-lines landmark file with the strict preset
//! squat-analyzer session.jsonl --difficulty strict
//!
//! # Read from stdin at 60 fps, counting shallow attempts as improper reps
//! cat session.jsonl | squat-analyzer - --fps 60 --count-shallow
//! ```

use clap::Parser;
use pose_landmarks::LandmarkError;
use squat_engine::ShallowRepPolicy;
use squat_thresholds::{ConfigError, Difficulty, PresetLoader, Thresholds};
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod reader;
pub mod worker;

pub use reader::{read_frames, ReadStats};
pub use worker::{spawn_analysis, AnalysisHandle, AnalysisOptions, AnalysisReport, Progress};

/// Analyzer error types
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line} is not a valid frame: {source}")]
    MalformedLine {
        line: u64,
        source: serde_json::Error,
    },

    #[error("Line {line} has invalid landmarks: {source}")]
    InvalidLandmarks { line: u64, source: LandmarkError },

    #[error("Frame rate must be positive, got {0}")]
    InvalidFrameRate(f64),

    #[error("Threshold configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Analysis worker stopped before producing a report")]
    WorkerGone,
}

/// Squat analyzer command line
#[derive(Parser, Debug)]
#[command(name = "squat-analyzer")]
#[command(author, version, about = "Count and grade squat reps from a body landmark stream")]
pub struct Cli {
    /// JSON-lines landmark file, or `-` for stdin
    #[arg(default_value = "-")]
    pub input: PathBuf,

    /// Threshold preset (lenient/beginner or strict/pro)
    #[arg(short, long, default_value = "lenient")]
    pub difficulty: Difficulty,

    /// File overriding preset values
    #[arg(long, value_name = "FILE")]
    pub thresholds: Option<PathBuf>,

    /// Frame rate used to derive missing timestamps
    #[arg(long, default_value_t = 30.0)]
    pub fps: f64,

    /// Count attempts that never reach full depth as improper reps
    #[arg(long)]
    pub count_shallow: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// Whether input comes from stdin
    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }

    /// Resolve thresholds: built-in presets, then the override file, then
    /// `SQUAT_*` environment variables
    pub fn load_thresholds(&self) -> Result<Thresholds, AnalyzerError> {
        let mut loader = PresetLoader::new().with_env(true);
        if let Some(path) = &self.thresholds {
            loader = loader.with_file(path);
        }
        Ok(loader.load()?.get(self.difficulty)?)
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            shallow_policy: if self.count_shallow {
                ShallowRepPolicy::CountImproper
            } else {
                ShallowRepPolicy::Discard
            },
            ..AnalysisOptions::default()
        }
    }
}

/// Initialize logging to stderr; `RUST_LOG` overrides the default `info` level
pub fn init_logging(json: bool) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["squat-analyzer"]);
        assert!(cli.reads_stdin());
        assert_eq!(cli.difficulty, Difficulty::Lenient);
        assert_eq!(cli.fps, 30.0);
        assert_eq!(
            cli.analysis_options().shallow_policy,
            ShallowRepPolicy::Discard
        );
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "squat-analyzer",
            "session.jsonl",
            "--difficulty",
            "pro",
            "--fps",
            "60",
            "--count-shallow",
        ]);
        assert!(!cli.reads_stdin());
        assert_eq!(cli.difficulty, Difficulty::Strict);
        assert_eq!(cli.fps, 60.0);
        assert_eq!(
            cli.analysis_options().shallow_policy,
            ShallowRepPolicy::CountImproper
        );
    }

    #[test]
    fn test_unknown_difficulty_rejected() {
        assert!(Cli::try_parse_from(["squat-analyzer", "--difficulty", "extreme"]).is_err());
    }

    #[test]
    fn test_missing_threshold_file() {
        let cli = Cli::parse_from(["squat-analyzer", "--thresholds", "/nonexistent/presets.toml"]);
        assert!(matches!(cli.load_thresholds(), Err(AnalyzerError::Config(_))));
    }
}
