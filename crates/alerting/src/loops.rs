//! Repeating audio and haptic background loops
//!
//! Each started loop gets its own stop signal, checked before every re-issue.
//! Stopping only signals; it never waits for the current cycle.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::config::HapticPattern;
use crate::sinks::{AudioDevice, HapticDevice};

/// Handle to one running loop
#[derive(Debug)]
pub(crate) struct LoopHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LoopHandle {
    pub(crate) fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Signal the loop to stop and return immediately
    pub(crate) fn signal_stop(self) {
        // The loop may already have exited; a closed channel is fine
        let _ = self.stop.send(true);
    }
}

/// Replay `asset` each time playback completes, until stopped.
///
/// A failed playback ends the loop.
pub(crate) fn spawn_audio_loop(device: Arc<dyn AudioDevice>, asset: String) -> LoopHandle {
    let (stop, mut stopped) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut cycles = 0u64;
        loop {
            if *stopped.borrow() {
                break;
            }
            tokio::select! {
                biased;
                _ = stopped.changed() => break,
                result = device.play(&asset) => match result {
                    Ok(()) => {
                        cycles += 1;
                        debug!(cycles, "Alert sound cycle completed");
                    }
                    Err(e) => {
                        warn!("Alert sound playback failed, audio channel inactive: {}", e);
                        break;
                    }
                },
            }
        }
        debug!(cycles, "Audio loop stopped");
    });

    LoopHandle { stop, task }
}

/// Pulse `pattern` every `interval`, until stopped.
///
/// A failed pulse is logged and the next one goes out on schedule.
pub(crate) fn spawn_haptic_loop(
    device: Arc<dyn HapticDevice>,
    pattern: HapticPattern,
    interval: Duration,
) -> LoopHandle {
    let (stop, mut stopped) = watch::channel(false);

    let task = tokio::spawn(async move {
        // Pulses start on a fixed period regardless of how long each one takes
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = stopped.changed() => break,
                _ = ticker.tick() => {}
            }
            if *stopped.borrow() {
                break;
            }
            tokio::select! {
                biased;
                _ = stopped.changed() => break,
                result = device.pulse(&pattern) => {
                    if let Err(e) = result {
                        warn!("Haptic pulse failed: {}", e);
                    }
                }
            }
        }
        debug!("Haptic loop stopped");
    });

    LoopHandle { stop, task }
}
