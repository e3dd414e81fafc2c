//! Log-only output devices
//!
//! Stand-ins for the platform audio, vibration, volume and overlay services.
//! They log every command and keep enough state to be inspected afterwards.

use alerting::{AlertError, AlertOverlay, AudioDevice, HapticDevice, HapticPattern, VolumeControl};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info};

/// Simulated device set
#[derive(Debug)]
pub struct SimulatedDevices {
    /// How long one playback of the alert asset lasts
    playback: Duration,
    volume: Mutex<f32>,
    overlay: AtomicBool,
    plays: AtomicU64,
    pulses: AtomicU64,
    halt: Notify,
}

impl SimulatedDevices {
    pub fn new(initial_volume: f32, playback: Duration) -> Self {
        Self {
            playback,
            volume: Mutex::new(initial_volume),
            overlay: AtomicBool::new(false),
            plays: AtomicU64::new(0),
            pulses: AtomicU64::new(0),
            halt: Notify::new(),
        }
    }

    pub fn volume_level(&self) -> f32 {
        *self.volume.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn overlay_alerting(&self) -> bool {
        self.overlay.load(Ordering::SeqCst)
    }

    /// Playbacks started so far
    pub fn plays(&self) -> u64 {
        self.plays.load(Ordering::SeqCst)
    }

    /// Haptic pulses issued so far
    pub fn pulses(&self) -> u64 {
        self.pulses.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedDevices {
    fn default() -> Self {
        Self::new(0.5, Duration::from_millis(1200))
    }
}

#[async_trait]
impl AudioDevice for SimulatedDevices {
    async fn play(&self, asset: &str) -> Result<(), AlertError> {
        let n = self.plays.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(asset, n, "Playing alert sound");
        tokio::select! {
            _ = tokio::time::sleep(self.playback) => {}
            _ = self.halt.notified() => debug!(asset, "Playback halted"),
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), AlertError> {
        info!("Alert sound stopped");
        self.halt.notify_waiters();
        Ok(())
    }
}

#[async_trait]
impl HapticDevice for SimulatedDevices {
    async fn pulse(&self, pattern: &HapticPattern) -> Result<(), AlertError> {
        self.pulses.fetch_add(1, Ordering::SeqCst);
        debug!(segments = pattern.timings_ms.len(), "Vibrating");
        Ok(())
    }

    async fn stop(&self) -> Result<(), AlertError> {
        info!("Vibration stopped");
        Ok(())
    }
}

#[async_trait]
impl VolumeControl for SimulatedDevices {
    async fn get(&self) -> Result<f32, AlertError> {
        Ok(self.volume_level())
    }

    async fn set(&self, level: f32) -> Result<(), AlertError> {
        let mut volume = self
            .volume
            .lock()
            .map_err(|_| AlertError::Volume("volume state poisoned".into()))?;
        info!(from = *volume, to = level, "System volume set");
        *volume = level;
        Ok(())
    }
}

#[async_trait]
impl AlertOverlay for SimulatedDevices {
    async fn set_alerting(&self, alerting: bool) -> Result<(), AlertError> {
        if self.overlay.swap(alerting, Ordering::SeqCst) != alerting {
            info!(alerting, "Alert overlay changed");
        }
        Ok(())
    }
}
