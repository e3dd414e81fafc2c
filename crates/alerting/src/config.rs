//! Alert output configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::AlertError;

/// Vibration pattern issued on every haptic pulse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HapticPattern {
    /// Alternating off/on segment lengths (milliseconds)
    pub timings_ms: Vec<u64>,
    /// Amplitude per segment (0-255)
    pub amplitudes: Vec<u8>,
}

impl Default for HapticPattern {
    fn default() -> Self {
        Self {
            timings_ms: vec![0, 40, 20, 40],
            amplitudes: vec![0, 255, 0, 255],
        }
    }
}

/// Alert coordinator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Sound asset replayed for the duration of an alert
    pub alert_asset: String,

    pub haptic_pattern: HapticPattern,

    /// Delay between haptic pulses (default: 100ms)
    pub haptic_interval_ms: u64,

    /// System volume during daytime alerts (default: 0.7)
    pub day_volume: f32,

    /// System volume during night alerts (default: 1.0)
    pub night_volume: f32,

    /// Volume restored when the original level could not be read
    pub fallback_restore_volume: f32,

    /// Pause between raising the volume and starting playback
    pub volume_settle_ms: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            alert_asset: "alert".to_string(),
            haptic_pattern: HapticPattern::default(),
            haptic_interval_ms: 100,
            day_volume: 0.7,
            night_volume: 1.0,
            fallback_restore_volume: 0.5,
            volume_settle_ms: 150,
        }
    }
}

impl AlertConfig {
    pub fn haptic_interval(&self) -> Duration {
        Duration::from_millis(self.haptic_interval_ms)
    }

    pub fn volume_settle(&self) -> Duration {
        Duration::from_millis(self.volume_settle_ms)
    }

    /// Alert volume for the time of day
    pub fn alert_volume(&self, is_night: bool) -> f32 {
        if is_night {
            self.night_volume
        } else {
            self.day_volume
        }
    }

    pub fn validate(&self) -> Result<(), AlertError> {
        for (name, level) in [
            ("day_volume", self.day_volume),
            ("night_volume", self.night_volume),
            ("fallback_restore_volume", self.fallback_restore_volume),
        ] {
            if !(0.0..=1.0).contains(&level) {
                return Err(AlertError::Config(format!(
                    "{name} must be in [0, 1], got {level}"
                )));
            }
        }
        if self.haptic_interval_ms == 0 {
            return Err(AlertError::Config("haptic_interval_ms must be positive".into()));
        }
        if self.alert_asset.is_empty() {
            return Err(AlertError::Config("alert_asset must not be empty".into()));
        }
        Ok(())
    }
}
