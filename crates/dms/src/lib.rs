//! Driver Monitoring System (DMS)
//!
//! Turns the per-frame eye observations of an external face detector into
//! drowsiness decisions:
//! - Single-flight frame gate (excess frames are dropped)
//! - Debounced closed-eye run counting
//! - Night-time sensitivity boost
//! - Alert entry/exit transitions for the alerting layer

pub mod config;
pub mod gate;
pub mod machine;
pub mod observation;
pub mod state;

pub use config::DetectionConfig;
pub use gate::{FrameGate, GatePermit};
pub use machine::{step, DrowsinessStateMachine};
pub use observation::{Eye, EyeObservation, FrameInput, Timestamp};
pub use state::{EngineState, Transition};

use thiserror::Error;

/// DMS error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DmsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{eye} eye open probability {value} is outside [0, 1]")]
    InvalidProbability { eye: Eye, value: f32 },
}
