//! Drowsiness Detection Engine
//!
//! Wires the single-flight frame gate and drowsiness state machine from
//! `dms` to the alert coordinator from `alerting`, and provides the ambient
//! pieces needed to run it: layered settings, logging, simulated output
//! devices and a recorded-frame replay source.

pub mod devices;
pub mod engine;
pub mod replay;
pub mod settings;

pub use devices::SimulatedDevices;
pub use engine::{DrowsinessEngine, EngineStats};
pub use settings::{EngineSettings, LoggingConfig};

use alerting::AlertError;
use dms::DmsError;
use thiserror::Error;
use tracing_subscriber::FmtSubscriber;

/// Engine error types
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Detection configuration invalid: {0}")]
    Detection(#[from] DmsError),

    #[error("Alert configuration invalid: {0}")]
    Alert(#[from] AlertError),

    #[error("Replay line {line}: {message}")]
    Replay { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Initialize logging
pub fn init_logging(logging: &LoggingConfig) -> Result<(), EngineError> {
    let builder = FmtSubscriber::builder()
        .with_max_level(logging.max_level()?)
        .with_target(true);

    let result = if logging.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| EngineError::Logging(e.to_string()))
}
