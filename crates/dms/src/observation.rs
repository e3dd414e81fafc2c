//! Per-frame eye observations delivered by the external face detector

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::DmsError;

/// A single instant, sampled once per frame.
///
/// The monotonic half drives retrigger timing, the wall-clock half drives
/// the night window. Both come from the same sample so a state-machine step
/// stays pure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub monotonic: Instant,
    /// Local wall-clock time
    pub wall: NaiveDateTime,
}

impl Timestamp {
    /// Sample the current instant
    pub fn now() -> Self {
        Self {
            monotonic: Instant::now(),
            wall: Local::now().naive_local(),
        }
    }

    pub fn at(monotonic: Instant, wall: NaiveDateTime) -> Self {
        Self { monotonic, wall }
    }

    /// Local wall-clock hour (0-23)
    pub fn hour(&self) -> u32 {
        self.wall.hour()
    }

    /// Monotonic time elapsed since `earlier` (zero if `earlier` is later)
    pub fn since(&self, earlier: &Timestamp) -> Duration {
        self.monotonic.saturating_duration_since(earlier.monotonic)
    }

    /// The same instant shifted forward by `by` on both clocks
    pub fn advanced_by(&self, by: Duration) -> Self {
        let wall = chrono::Duration::from_std(by)
            .ok()
            .and_then(|d| self.wall.checked_add_signed(d))
            .unwrap_or(self.wall);
        Self {
            monotonic: self.monotonic + by,
            wall,
        }
    }
}

/// Eye-open probabilities for the most prominent face in one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeObservation {
    /// Left eye open probability (0-1), `None` if the detector gave none
    pub left_open_probability: Option<f32>,
    /// Right eye open probability (0-1), `None` if the detector gave none
    pub right_open_probability: Option<f32>,
    pub captured_at: Timestamp,
}

impl EyeObservation {
    pub fn new(left: f32, right: f32, captured_at: Timestamp) -> Self {
        Self {
            left_open_probability: Some(left),
            right_open_probability: Some(right),
            captured_at,
        }
    }

    /// Build an observation, rejecting probabilities outside [0, 1]
    pub fn try_new(
        left: Option<f32>,
        right: Option<f32>,
        captured_at: Timestamp,
    ) -> Result<Self, DmsError> {
        check_probability(Eye::Left, left)?;
        check_probability(Eye::Right, right)?;
        Ok(Self {
            left_open_probability: left,
            right_open_probability: right,
            captured_at,
        })
    }

    /// Both probabilities, if present and finite
    pub fn eye_pair(&self) -> Option<(f32, f32)> {
        let left = self.left_open_probability.filter(|p| p.is_finite())?;
        let right = self.right_open_probability.filter(|p| p.is_finite())?;
        Some((left, right))
    }
}

/// Which eye a probability belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eye {
    Left,
    Right,
}

impl std::fmt::Display for Eye {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Eye::Left => f.write_str("left"),
            Eye::Right => f.write_str("right"),
        }
    }
}

fn check_probability(eye: Eye, value: Option<f32>) -> Result<(), DmsError> {
    match value {
        Some(v) if !(0.0..=1.0).contains(&v) => {
            Err(DmsError::InvalidProbability { eye, value: v })
        }
        _ => Ok(()),
    }
}

/// What the detector reported for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameInput {
    Eyes(EyeObservation),
    /// Detection ran but found no face
    NoFace,
}

impl FrameInput {
    /// Both eye probabilities, or `None` for no-face and missing eyes
    pub fn eye_pair(&self) -> Option<(f32, f32)> {
        match self {
            FrameInput::Eyes(obs) => obs.eye_pair(),
            FrameInput::NoFace => None,
        }
    }
}

impl From<EyeObservation> for FrameInput {
    fn from(obs: EyeObservation) -> Self {
        FrameInput::Eyes(obs)
    }
}
