//! Alerting System
//!
//! Turns drowsiness transitions into sound, vibration, overlay and system
//! volume commands, and guarantees every channel is stopped and the volume
//! restored when an alert ends or the engine shuts down.

mod config;
mod coordinator;
mod loops;
mod sinks;

pub use config::{AlertConfig, HapticPattern};
pub use coordinator::{AlertChannelState, AlertCoordinator};
pub use sinks::{AlertOverlay, AlertSinks, AudioDevice, HapticDevice, VolumeControl};

use thiserror::Error;

/// Alert output errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlertError {
    #[error("Volume control failed: {0}")]
    Volume(String),

    #[error("Audio playback failed: {0}")]
    Audio(String),

    #[error("Haptic output failed: {0}")]
    Haptic(String),

    #[error("Overlay update failed: {0}")]
    Overlay(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
