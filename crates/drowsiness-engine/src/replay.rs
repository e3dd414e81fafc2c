//! JSON-lines replay observation source
//!
//! Each line is one detector result:
//!
//! ```text
//! {"kind":"eyes","left":0.2,"right":0.2,"at_ms":0,"wall":"2024-05-01T23:00:00"}
//! {"kind":"eyes","left":0.9,"right":null,"at_ms":66}
//! {"kind":"no_face","at_ms":133}
//! ```
//!
//! Frames are delivered at their `at_ms` offsets, each on its own task the
//! way a camera callback would, so the engine may drop overlapping frames.

use chrono::NaiveDateTime;
use dms::{EyeObservation, Timestamp};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::engine::DrowsinessEngine;
use crate::EngineError;

/// One recorded detector result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayFrame {
    Eyes {
        left: Option<f32>,
        right: Option<f32>,
        /// Offset from the start of the recording
        at_ms: u64,
        /// Local wall-clock time of the frame, if recorded
        #[serde(default, skip_serializing_if = "Option::is_none")]
        wall: Option<NaiveDateTime>,
    },
    NoFace {
        at_ms: u64,
    },
}

impl ReplayFrame {
    pub fn at_ms(&self) -> u64 {
        match self {
            ReplayFrame::Eyes { at_ms, .. } | ReplayFrame::NoFace { at_ms } => *at_ms,
        }
    }
}

/// Parse a whole recording. Blank lines and `#` comments are skipped.
pub fn parse_frames(text: &str) -> Result<Vec<ReplayFrame>, EngineError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| EngineError::Replay {
                line: i + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Read a recording from disk
pub async fn load_frames(path: &Path) -> Result<Vec<ReplayFrame>, EngineError> {
    let text = tokio::fs::read_to_string(path).await?;
    parse_frames(&text)
}

/// Deliver `frames` to `engine` in real time, starting now
pub async fn replay(engine: Arc<DrowsinessEngine>, frames: Vec<ReplayFrame>) {
    let origin = Timestamp::now();
    let start = tokio::time::Instant::now();
    let mut in_flight = JoinSet::new();

    info!(frames = frames.len(), "Replaying recorded frames");
    for frame in frames {
        let offset = Duration::from_millis(frame.at_ms());
        tokio::time::sleep_until(start + offset).await;

        let engine = engine.clone();
        match frame {
            ReplayFrame::Eyes { left, right, wall, .. } => {
                let mut captured_at = origin.advanced_by(offset);
                if let Some(wall) = wall {
                    captured_at.wall = wall;
                }
                let observation = match EyeObservation::try_new(left, right, captured_at) {
                    Ok(observation) => observation,
                    Err(e) => {
                        warn!("Skipping recorded frame at {}ms: {}", offset.as_millis(), e);
                        continue;
                    }
                };
                in_flight.spawn(async move { engine.feed(observation).await });
            }
            ReplayFrame::NoFace { .. } => {
                in_flight.spawn(async move { engine.feed_no_face().await });
            }
        }
    }

    while in_flight.join_next().await.is_some() {}
    info!("Replay finished");
}
