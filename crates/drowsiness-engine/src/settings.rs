//! Layered engine settings
//!
//! Built-in defaults, then an optional file, then `DROWSY_`-prefixed
//! environment variables (`DROWSY_DETECTION__DROWSY_FRAME_THRESHOLD=10`).

use alerting::AlertConfig;
use config::{Config, Environment, File};
use dms::DetectionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::Level;

use crate::EngineError;

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<Level, EngineError> {
        self.level
            .parse()
            .map_err(|_| EngineError::Logging(format!("unknown log level '{}'", self.level)))
    }
}

/// Everything the engine binary can be configured with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub detection: DetectionConfig,
    pub alert: AlertConfig,
    pub logging: LoggingConfig,
}

impl EngineSettings {
    /// Load and validate settings. A given `path` must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, EngineError> {
        Self::load_with_env(path, "DROWSY")
    }

    fn load_with_env(path: Option<&Path>, env_prefix: &str) -> Result<Self, EngineError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: EngineSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.detection.validate()?;
        self.alert.validate()?;
        self.logging.max_level()?;
        Ok(())
    }
}
