//! Output devices driven by the alert coordinator

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::HapticPattern;
use crate::AlertError;

/// Sound output
#[async_trait]
pub trait AudioDevice: Send + Sync {
    /// Play `asset` once, resolving when playback finishes naturally
    async fn play(&self, asset: &str) -> Result<(), AlertError>;

    /// Stop any playback in progress
    async fn stop(&self) -> Result<(), AlertError>;

    /// Release the underlying device handle
    async fn release(&self) -> Result<(), AlertError> {
        Ok(())
    }
}

/// Vibration output
#[async_trait]
pub trait HapticDevice: Send + Sync {
    /// Issue one vibration with `pattern`
    async fn pulse(&self, pattern: &HapticPattern) -> Result<(), AlertError>;

    /// Cancel any vibration in progress
    async fn stop(&self) -> Result<(), AlertError>;

    async fn release(&self) -> Result<(), AlertError> {
        Ok(())
    }
}

/// System media volume, 0.0 to 1.0
#[async_trait]
pub trait VolumeControl: Send + Sync {
    async fn get(&self) -> Result<f32, AlertError>;

    async fn set(&self, level: f32) -> Result<(), AlertError>;
}

/// On-screen alert indicator
#[async_trait]
pub trait AlertOverlay: Send + Sync {
    async fn set_alerting(&self, alerting: bool) -> Result<(), AlertError>;
}

/// The devices one coordinator drives
#[derive(Clone)]
pub struct AlertSinks {
    pub audio: Arc<dyn AudioDevice>,
    pub haptic: Arc<dyn HapticDevice>,
    pub volume: Arc<dyn VolumeControl>,
    pub overlay: Arc<dyn AlertOverlay>,
}

impl AlertSinks {
    /// Use one value for every device
    pub fn from_shared<D>(device: Arc<D>) -> Self
    where
        D: AudioDevice + HapticDevice + VolumeControl + AlertOverlay + 'static,
    {
        Self {
            audio: device.clone(),
            haptic: device.clone(),
            volume: device.clone(),
            overlay: device,
        }
    }
}

impl std::fmt::Debug for AlertSinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertSinks").finish_non_exhaustive()
    }
}
