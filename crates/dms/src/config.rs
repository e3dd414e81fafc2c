//! Drowsiness detection configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::DmsError;

/// Tunable parameters of the drowsiness state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Eye-open probability below which an eye counts as closed (default: 0.5)
    pub closed_eye_threshold: f32,

    /// Threshold multiplier applied inside the night window (default: 1.2)
    pub night_multiplier: f32,

    /// First hour of the night window, local wall clock (default: 22)
    pub night_start_hour: u32,

    /// Last hour of the night window, inclusive (default: 5)
    pub night_end_hour: u32,

    /// Consecutive closed-eye frames before an alert (default: 8)
    pub drowsy_frame_threshold: u32,

    /// Minimum time between two alert entries (milliseconds)
    pub alert_retrigger_interval_ms: u64,

    /// Let a crossing suppressed by the retrigger interval fire later in the
    /// same closed-eye run once the interval has elapsed
    pub rearm_while_closed: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            closed_eye_threshold: 0.5,
            night_multiplier: 1.2,
            night_start_hour: 22,
            night_end_hour: 5,
            drowsy_frame_threshold: 8,
            alert_retrigger_interval_ms: 3000,
            rearm_while_closed: false,
        }
    }
}

impl DetectionConfig {
    /// Retrigger interval as a duration
    pub fn alert_retrigger_interval(&self) -> Duration {
        Duration::from_millis(self.alert_retrigger_interval_ms)
    }

    /// Whether `hour` falls inside the night window.
    ///
    /// A window whose start is after its end wraps midnight, so the default
    /// 22..=5 covers 22:00 through 05:59.
    pub fn is_night(&self, hour: u32) -> bool {
        if self.night_start_hour > self.night_end_hour {
            hour >= self.night_start_hour || hour <= self.night_end_hour
        } else {
            hour >= self.night_start_hour && hour <= self.night_end_hour
        }
    }

    /// Closed-eye threshold in effect at `hour`
    pub fn effective_threshold(&self, hour: u32) -> f32 {
        if self.is_night(hour) {
            self.closed_eye_threshold * self.night_multiplier
        } else {
            self.closed_eye_threshold
        }
    }

    /// Check that every field is in range
    pub fn validate(&self) -> Result<(), DmsError> {
        if !(self.closed_eye_threshold > 0.0 && self.closed_eye_threshold <= 1.0) {
            return Err(DmsError::Config(format!(
                "closed_eye_threshold must be in (0, 1], got {}",
                self.closed_eye_threshold
            )));
        }
        if !(self.night_multiplier.is_finite() && self.night_multiplier > 0.0) {
            return Err(DmsError::Config(format!(
                "night_multiplier must be positive, got {}",
                self.night_multiplier
            )));
        }
        if self.night_start_hour > 23 || self.night_end_hour > 23 {
            return Err(DmsError::Config(format!(
                "night window hours must be 0..=23, got {}..={}",
                self.night_start_hour, self.night_end_hour
            )));
        }
        if self.drowsy_frame_threshold == 0 {
            return Err(DmsError::Config(
                "drowsy_frame_threshold must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_night_threshold() {
        let config = DetectionConfig::default();

        assert!((config.effective_threshold(23) - 0.6).abs() < 1e-6);
        assert!((config.effective_threshold(4) - 0.6).abs() < 1e-6);
        assert!((config.effective_threshold(12) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_night_window_endpoints() {
        let config = DetectionConfig::default();

        assert!(config.is_night(22));
        assert!(config.is_night(0));
        assert!(config.is_night(5));
        assert!(!config.is_night(6));
        assert!(!config.is_night(21));
    }

    #[test]
    fn test_non_wrapping_window() {
        let config = DetectionConfig {
            night_start_hour: 1,
            night_end_hour: 4,
            ..Default::default()
        };

        assert!(config.is_night(1));
        assert!(config.is_night(4));
        assert!(!config.is_night(0));
        assert!(!config.is_night(23));
    }

    #[test]
    fn test_validation() {
        assert!(DetectionConfig::default().validate().is_ok());

        let zero_frames = DetectionConfig {
            drowsy_frame_threshold: 0,
            ..Default::default()
        };
        assert!(zero_frames.validate().is_err());

        let bad_hour = DetectionConfig {
            night_start_hour: 24,
            ..Default::default()
        };
        assert!(bad_hour.validate().is_err());

        let bad_threshold = DetectionConfig {
            closed_eye_threshold: 1.5,
            ..Default::default()
        };
        assert!(bad_threshold.validate().is_err());
    }
}
