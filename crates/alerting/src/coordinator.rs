//! Alert Coordinator Implementation

use dms::Transition;
use tracing::{debug, info, warn};

use crate::config::AlertConfig;
use crate::loops::{spawn_audio_loop, spawn_haptic_loop, LoopHandle};
use crate::sinks::AlertSinks;

/// Snapshot of the alert channels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AlertChannelState {
    pub audio_active: bool,
    pub haptic_active: bool,
    /// Volume to restore when the current episode ends
    pub saved_system_volume: Option<f32>,
}

/// Drives sound, vibration, overlay and system volume from state-machine
/// transitions.
///
/// Calls must be serialized by the owner. Device failures are logged and
/// never stop the remaining channel operations of a transition.
pub struct AlertCoordinator {
    config: AlertConfig,
    sinks: AlertSinks,
    audio_loop: Option<LoopHandle>,
    haptic_loop: Option<LoopHandle>,
    saved_system_volume: Option<f32>,
    /// Set between entering and leaving an alert episode
    episode_active: bool,
    shut_down: bool,
}

impl AlertCoordinator {
    pub fn new(config: AlertConfig, sinks: AlertSinks) -> Self {
        info!("Creating alert coordinator with config: {:?}", config);
        Self {
            config,
            sinks,
            audio_loop: None,
            haptic_loop: None,
            saved_system_volume: None,
            episode_active: false,
            shut_down: false,
        }
    }

    /// Apply one state-machine transition to the output channels
    pub async fn on_transition(&mut self, transition: Transition, is_night: bool) {
        if self.shut_down {
            if transition != Transition::NoChange {
                warn!("Ignoring {} after shutdown", transition.as_str());
            }
            return;
        }

        match transition {
            Transition::EnteredAlert => self.enter_alert(is_night).await,
            Transition::ExitedAlert => self.exit_alert().await,
            Transition::Reaffirmed | Transition::NoChange => {}
        }
    }

    async fn enter_alert(&mut self, is_night: bool) {
        self.set_overlay(true).await;

        if !self.episode_active {
            self.episode_active = true;

            let saved = match self.sinks.volume.get().await {
                Ok(level) => level,
                Err(e) => {
                    warn!(
                        "Could not read system volume, will restore {}: {}",
                        self.config.fallback_restore_volume, e
                    );
                    self.config.fallback_restore_volume
                }
            };
            self.saved_system_volume = Some(saved);

            let level = self.config.alert_volume(is_night);
            match self.sinks.volume.set(level).await {
                Ok(()) => debug!(level, saved, "Alert volume applied"),
                Err(e) => warn!("Could not raise system volume: {}", e),
            }

            // Let the new level take effect before the first sound
            tokio::time::sleep(self.config.volume_settle()).await;
        }

        self.start_audio();
        self.start_haptic();
        info!(night = is_night, "Alert channels started");
    }

    async fn exit_alert(&mut self) {
        self.set_overlay(false).await;

        if !self.episode_active {
            debug!("Exit without an active alert episode");
            return;
        }
        self.episode_active = false;

        self.stop_haptic(false).await;
        self.stop_audio(false).await;
        self.restore_volume().await;
        info!("Alert channels stopped");
    }

    /// Stop every channel and restore the volume, whatever the current state.
    /// Safe to call repeatedly.
    pub async fn shutdown(&mut self) {
        if self.shut_down {
            debug!("Alert coordinator already shut down");
            return;
        }
        info!("Shutting down alert coordinator");

        self.stop_haptic(true).await;
        self.stop_audio(true).await;
        self.restore_volume().await;
        self.set_overlay(false).await;
        self.episode_active = false;

        if let Err(e) = self.sinks.audio.release().await {
            warn!("Failed to release audio device: {}", e);
        }
        if let Err(e) = self.sinks.haptic.release().await {
            warn!("Failed to release haptic device: {}", e);
        }
        self.shut_down = true;
    }

    fn start_audio(&mut self) {
        if self.audio_loop.as_ref().is_some_and(LoopHandle::is_running) {
            return;
        }
        self.audio_loop = Some(spawn_audio_loop(
            self.sinks.audio.clone(),
            self.config.alert_asset.clone(),
        ));
    }

    fn start_haptic(&mut self) {
        if self.haptic_loop.as_ref().is_some_and(LoopHandle::is_running) {
            return;
        }
        self.haptic_loop = Some(spawn_haptic_loop(
            self.sinks.haptic.clone(),
            self.config.haptic_pattern.clone(),
            self.config.haptic_interval(),
        ));
    }

    async fn stop_audio(&mut self, force: bool) {
        let was_running = match self.audio_loop.take() {
            Some(handle) => {
                handle.signal_stop();
                true
            }
            None => false,
        };
        if was_running || force {
            if let Err(e) = self.sinks.audio.stop().await {
                warn!("Failed to stop alert sound: {}", e);
            }
        }
    }

    async fn stop_haptic(&mut self, force: bool) {
        let was_running = match self.haptic_loop.take() {
            Some(handle) => {
                handle.signal_stop();
                true
            }
            None => false,
        };
        if was_running || force {
            if let Err(e) = self.sinks.haptic.stop().await {
                warn!("Failed to stop vibration: {}", e);
            }
        }
    }

    async fn restore_volume(&mut self) {
        if let Some(level) = self.saved_system_volume.take() {
            match self.sinks.volume.set(level).await {
                Ok(()) => debug!(level, "System volume restored"),
                Err(e) => warn!("Failed to restore system volume to {}: {}", level, e),
            }
        }
    }

    async fn set_overlay(&self, alerting: bool) {
        if let Err(e) = self.sinks.overlay.set_alerting(alerting).await {
            warn!("Failed to update alert overlay: {}", e);
        }
    }

    pub fn channel_state(&self) -> AlertChannelState {
        AlertChannelState {
            audio_active: self.audio_loop.as_ref().is_some_and(LoopHandle::is_running),
            haptic_active: self.haptic_loop.as_ref().is_some_and(LoopHandle::is_running),
            saved_system_volume: self.saved_system_volume,
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }
}
