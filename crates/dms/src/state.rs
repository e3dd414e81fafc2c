//! Engine state and state-machine transitions

use serde::{Deserialize, Serialize};

use crate::observation::Timestamp;

/// Outcome of feeding one frame to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    NoChange,
    /// An alert episode started
    EnteredAlert,
    /// The active alert episode ended
    ExitedAlert,
    /// Another closed-eye frame while already alerting
    Reaffirmed,
}

impl Transition {
    /// Label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::NoChange => "no_change",
            Transition::EnteredAlert => "entered_alert",
            Transition::ExitedAlert => "exited_alert",
            Transition::Reaffirmed => "reaffirmed",
        }
    }
}

/// Drowsiness state carried from frame to frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineState {
    /// Consecutive closed-eye frames since the last reset
    pub closed_eye_run: u32,

    /// When the last alert episode started
    pub last_alert_at: Option<Timestamp>,

    /// Whether an alert episode is active
    pub is_alerting: bool,
}

impl EngineState {
    /// Clear the run and the alerting flag.
    ///
    /// `last_alert_at` survives so the retrigger interval still applies to
    /// the next closed-eye run.
    pub fn reset(&mut self) {
        self.closed_eye_run = 0;
        self.is_alerting = false;
    }
}
