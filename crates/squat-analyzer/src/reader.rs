//! JSON-lines landmark input
//!
//! One frame per line, either as named landmarks
//! `{"timestamp_ms": 0, "landmarks": {"left_knee": {"x": .., "y": .., "visibility": ..}, ..}}`
//! or as a full 33-point pose array under `landmarks`. `timestamp_ms` may be
//! omitted, in which case it is derived from the frame index and frame rate.

use crate::AnalyzerError;
use pose_landmarks::{FrameLandmarks, Landmark, LandmarkId};
use serde::Deserialize;
use std::collections::BTreeMap;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLandmarks {
    Named(BTreeMap<String, Landmark>),
    Pose(Vec<Landmark>),
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    timestamp_ms: Option<u64>,
    landmarks: RawLandmarks,
}

/// Counters from one input pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Non-blank lines seen
    pub frames: u64,
    /// Lines that could not be parsed (forwarded as empty frames)
    pub malformed: u64,
}

/// Timestamp for a frame index at `fps` frames per second
pub fn derive_timestamp_ms(frame_index: u64, fps: f64) -> u64 {
    (frame_index as f64 * 1000.0 / fps).round() as u64
}

/// Parse one input line into a frame
pub fn parse_line(
    line: &str,
    line_no: u64,
    frame_index: u64,
    fps: f64,
) -> Result<FrameLandmarks, AnalyzerError> {
    let raw: RawFrame = serde_json::from_str(line)
        .map_err(|source| AnalyzerError::MalformedLine { line: line_no, source })?;
    let timestamp_ms = raw
        .timestamp_ms
        .unwrap_or_else(|| derive_timestamp_ms(frame_index, fps));

    let invalid = |source| AnalyzerError::InvalidLandmarks { line: line_no, source };
    match raw.landmarks {
        RawLandmarks::Pose(points) => {
            FrameLandmarks::from_pose_array(timestamp_ms, &points).map_err(invalid)
        }
        RawLandmarks::Named(named) => {
            let mut frame = FrameLandmarks::new(timestamp_ms);
            for (name, landmark) in named {
                match landmark_id(&name) {
                    Some(id) => frame.insert(id, landmark).map_err(invalid)?,
                    None => trace!("Ignoring untracked landmark {:?}", name),
                }
            }
            Ok(frame)
        }
    }
}

fn landmark_id(name: &str) -> Option<LandmarkId> {
    serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
}

/// Read JSON-lines frames from `input` and forward them to the worker.
///
/// Malformed lines are logged and forwarded as empty frames so the session
/// counts them as invalid and holds its state. They carry the timestamp of
/// the previous frame, or a derived one when no frame has been read yet.
/// Reading stops early when the worker has gone away.
pub async fn read_frames<R>(
    input: R,
    fps: f64,
    frames_tx: mpsc::Sender<FrameLandmarks>,
) -> Result<ReadStats, AnalyzerError>
where
    R: AsyncRead + Unpin,
{
    if !(fps.is_finite() && fps > 0.0) {
        return Err(AnalyzerError::InvalidFrameRate(fps));
    }

    let mut lines = BufReader::new(input).lines();
    let mut stats = ReadStats::default();
    let mut line_no = 0u64;
    let mut last_timestamp_ms: Option<u64> = None;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let frame_index = stats.frames;
        stats.frames += 1;
        let frame = match parse_line(line, line_no, frame_index, fps) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping frame: {}", e);
                stats.malformed += 1;
                let timestamp_ms = last_timestamp_ms
                    .unwrap_or_else(|| derive_timestamp_ms(frame_index, fps));
                FrameLandmarks::new(timestamp_ms)
            }
        };
        last_timestamp_ms = Some(frame.timestamp_ms);

        if frames_tx.send(frame).await.is_err() {
            debug!("Analysis worker gone, stopping input at line {}", line_no);
            break;
        }
    }

    info!(
        "Read {} frames ({} malformed) from {} lines",
        stats.frames, stats.malformed, line_no
    );
    Ok(stats)
}
