//! Frame gate → state machine → alert coordinator

use alerting::{AlertChannelState, AlertConfig, AlertCoordinator, AlertSinks};
use dms::{
    DetectionConfig, DrowsinessStateMachine, EngineState, EyeObservation, FrameGate, FrameInput,
    Timestamp, Transition,
};
use metrics::counter;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::EngineError;

/// Frame counters since the engine was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub admitted: u64,
    pub dropped: u64,
}

struct EngineCore {
    machine: DrowsinessStateMachine,
    coordinator: AlertCoordinator,
}

/// Drowsiness detection engine.
///
/// Frames may arrive from any task; at most one is analyzed at a time and
/// the rest are dropped. Coordinator calls happen only while holding the
/// gate, so they are strictly sequential.
pub struct DrowsinessEngine {
    gate: FrameGate,
    core: Mutex<EngineCore>,
    admitted: AtomicU64,
    dropped: AtomicU64,
    shut_down: AtomicBool,
}

impl DrowsinessEngine {
    /// Create an engine, validating both configurations
    pub fn new(
        detection: DetectionConfig,
        alert: AlertConfig,
        sinks: AlertSinks,
    ) -> Result<Self, EngineError> {
        detection.validate()?;
        alert.validate()?;
        info!(
            drowsy_frames = detection.drowsy_frame_threshold,
            threshold = detection.closed_eye_threshold,
            "Creating drowsiness engine"
        );

        Ok(Self {
            gate: FrameGate::new(),
            core: Mutex::new(EngineCore {
                machine: DrowsinessStateMachine::new(detection),
                coordinator: AlertCoordinator::new(alert, sinks),
            }),
            admitted: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Analyze one frame if no other frame is in flight.
    ///
    /// Returns whether the frame was admitted.
    pub async fn submit(&self, input: FrameInput, now: Timestamp) -> bool {
        if self.shut_down.load(Ordering::Acquire) {
            debug!("Frame ignored, engine shut down");
            return false;
        }

        let Some(_permit) = self.gate.try_acquire() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            counter!("dms_frames_dropped_total").increment(1);
            debug!("Frame dropped, analysis already in flight");
            return false;
        };
        self.analyze(input, now).await
    }

    /// Run one admitted frame through the state machine and coordinator.
    /// Must be called with the gate held.
    async fn analyze(&self, input: FrameInput, now: Timestamp) -> bool {
        let mut core = self.core.lock().await;
        // Shutdown may have finished while this frame waited for the lock
        if self.shut_down.load(Ordering::Acquire) {
            debug!("Frame ignored, engine shut down while waiting");
            return false;
        }
        self.admitted.fetch_add(1, Ordering::Relaxed);
        counter!("dms_frames_admitted_total").increment(1);

        let transition = core.machine.on_observation(&input, now);
        if transition != Transition::NoChange {
            counter!("dms_transitions_total", "kind" => transition.as_str()).increment(1);
        }

        let is_night = core.machine.is_night(&now);
        core.coordinator.on_transition(transition, is_night).await;
        true
    }

    /// Inbound observation from the detector, timed at its capture instant
    pub async fn feed(&self, observation: EyeObservation) {
        let now = observation.captured_at;
        self.submit(FrameInput::Eyes(observation), now).await;
    }

    /// Inbound "no face in this frame" signal
    pub async fn feed_no_face(&self) {
        self.submit(FrameInput::NoFace, Timestamp::now()).await;
    }

    /// Stop all alert output and refuse further frames. Idempotent.
    pub async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);

        let mut core = self.core.lock().await;
        core.machine.reset();
        core.coordinator.shutdown().await;
        info!(
            admitted = self.admitted.load(Ordering::Relaxed),
            dropped = self.dropped.load(Ordering::Relaxed),
            "Drowsiness engine shut down"
        );
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            admitted: self.admitted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    pub async fn engine_state(&self) -> EngineState {
        *self.core.lock().await.machine.state()
    }

    pub async fn channel_state(&self) -> AlertChannelState {
        self.core.lock().await.coordinator.channel_state()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }
}
