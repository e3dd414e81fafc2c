//! Debounced drowsiness state machine

use tracing::{debug, info};

use crate::config::DetectionConfig;
use crate::observation::{FrameInput, Timestamp};
use crate::state::{EngineState, Transition};

/// Advance `state` by one frame.
///
/// Pure: the same config, state, input and `now` always give the same
/// result. `now` supplies both the monotonic instant for the retrigger check
/// and the wall-clock hour for the night window.
pub fn step(
    config: &DetectionConfig,
    mut state: EngineState,
    input: &FrameInput,
    now: Timestamp,
) -> (EngineState, Transition) {
    let Some((left, right)) = input.eye_pair() else {
        // No face or a missing eye reads as eyes open
        return open_eyes(state);
    };

    let threshold = config.effective_threshold(now.hour());
    if !(left < threshold && right < threshold) {
        return open_eyes(state);
    }

    state.closed_eye_run = state.closed_eye_run.saturating_add(1);

    if state.is_alerting {
        return (state, Transition::Reaffirmed);
    }

    let crossing = if config.rearm_while_closed {
        state.closed_eye_run >= config.drowsy_frame_threshold
    } else {
        state.closed_eye_run == config.drowsy_frame_threshold
    };
    if !crossing {
        return (state, Transition::NoChange);
    }

    let debounced = match state.last_alert_at {
        Some(last) => now.since(&last) >= config.alert_retrigger_interval(),
        None => true,
    };
    if !debounced {
        debug!(
            run = state.closed_eye_run,
            "Drowsy threshold reached inside retrigger interval, alert suppressed"
        );
        return (state, Transition::NoChange);
    }

    state.last_alert_at = Some(now);
    state.is_alerting = true;
    (state, Transition::EnteredAlert)
}

fn open_eyes(mut state: EngineState) -> (EngineState, Transition) {
    let was_alerting = state.is_alerting;
    state.reset();
    if was_alerting {
        (state, Transition::ExitedAlert)
    } else {
        (state, Transition::NoChange)
    }
}

/// State machine owning its configuration and state
#[derive(Debug, Clone)]
pub struct DrowsinessStateMachine {
    config: DetectionConfig,
    state: EngineState,
}

impl DrowsinessStateMachine {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            state: EngineState::default(),
        }
    }

    /// Feed one frame and report the resulting transition
    pub fn on_observation(&mut self, input: &FrameInput, now: Timestamp) -> Transition {
        let (next, transition) = step(&self.config, self.state, input, now);
        self.state = next;

        match transition {
            Transition::EnteredAlert => info!(
                run = next.closed_eye_run,
                hour = now.hour(),
                night = self.config.is_night(now.hour()),
                "Drowsiness detected, entering alert"
            ),
            Transition::ExitedAlert => info!("Driver alert again, leaving alert"),
            Transition::Reaffirmed | Transition::NoChange => {}
        }

        transition
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Whether `now` falls inside the configured night window
    pub fn is_night(&self, now: &Timestamp) -> bool {
        self.config.is_night(now.hour())
    }

    /// Drop the current run and alert episode (on shutdown)
    pub fn reset(&mut self) {
        self.state.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::EyeObservation;
    use chrono::NaiveDate;
    use std::time::{Duration, Instant};

    const FRAME: Duration = Duration::from_millis(66);

    fn start_at(hour: u32) -> Timestamp {
        let wall = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap();
        Timestamp::at(Instant::now(), wall)
    }

    fn eyes(left: f32, right: f32, at: Timestamp) -> FrameInput {
        FrameInput::Eyes(EyeObservation::new(left, right, at))
    }

    /// Feed `count` identical frames one frame-period apart
    fn feed(
        machine: &mut DrowsinessStateMachine,
        now: &mut Timestamp,
        count: usize,
        left: f32,
        right: f32,
    ) -> Vec<Transition> {
        (0..count)
            .map(|_| {
                let t = machine.on_observation(&eyes(left, right, *now), *now);
                *now = now.advanced_by(FRAME);
                t
            })
            .collect()
    }

    #[test]
    fn test_daytime_alert_and_recovery() {
        let mut machine = DrowsinessStateMachine::new(DetectionConfig::default());
        let mut now = start_at(14);

        let transitions = feed(&mut machine, &mut now, 8, 0.2, 0.2);
        assert!(transitions[..7].iter().all(|t| *t == Transition::NoChange));
        assert_eq!(transitions[7], Transition::EnteredAlert);
        assert!(machine.state().is_alerting);

        let transitions = feed(&mut machine, &mut now, 1, 0.9, 0.9);
        assert_eq!(transitions, vec![Transition::ExitedAlert]);
        assert_eq!(machine.state().closed_eye_run, 0);
        assert!(!machine.state().is_alerting);
    }

    #[test]
    fn test_night_sensitivity() {
        let mut machine = DrowsinessStateMachine::new(DetectionConfig::default());
        let mut now = start_at(23);

        let transitions = feed(&mut machine, &mut now, 8, 0.55, 0.55);
        assert_eq!(transitions[7], Transition::EnteredAlert);

        // Same probabilities at midday stay below the base threshold
        let mut machine = DrowsinessStateMachine::new(DetectionConfig::default());
        let mut now = start_at(12);
        let transitions = feed(&mut machine, &mut now, 8, 0.55, 0.55);
        assert!(transitions.iter().all(|t| *t == Transition::NoChange));
        assert_eq!(machine.state().closed_eye_run, 0);
    }

    #[test]
    fn test_threshold_value_counts_as_open() {
        let mut machine = DrowsinessStateMachine::new(DetectionConfig::default());
        let mut now = start_at(12);

        feed(&mut machine, &mut now, 3, 0.2, 0.2);
        assert_eq!(machine.state().closed_eye_run, 3);

        feed(&mut machine, &mut now, 1, 0.5, 0.2);
        assert_eq!(machine.state().closed_eye_run, 0);
    }

    #[test]
    fn test_one_closed_eye_is_not_drowsy() {
        let mut machine = DrowsinessStateMachine::new(DetectionConfig::default());
        let mut now = start_at(12);

        let transitions = feed(&mut machine, &mut now, 10, 0.1, 0.8);
        assert!(transitions.iter().all(|t| *t == Transition::NoChange));
        assert_eq!(machine.state().closed_eye_run, 0);
    }

    #[test]
    fn test_reaffirmed_while_alerting() {
        let mut machine = DrowsinessStateMachine::new(DetectionConfig::default());
        let mut now = start_at(12);

        feed(&mut machine, &mut now, 8, 0.1, 0.1);
        let transitions = feed(&mut machine, &mut now, 5, 0.1, 0.1);
        assert!(transitions.iter().all(|t| *t == Transition::Reaffirmed));
        assert_eq!(machine.state().closed_eye_run, 13);
    }

    #[test]
    fn test_no_face_and_missing_eye_exit_alert() {
        let mut machine = DrowsinessStateMachine::new(DetectionConfig::default());
        let mut now = start_at(12);

        feed(&mut machine, &mut now, 8, 0.1, 0.1);
        assert_eq!(
            machine.on_observation(&FrameInput::NoFace, now),
            Transition::ExitedAlert
        );
        assert_eq!(machine.state().closed_eye_run, 0);

        now = now.advanced_by(Duration::from_secs(5));
        feed(&mut machine, &mut now, 8, 0.1, 0.1);
        assert!(machine.state().is_alerting);

        let one_eye = FrameInput::Eyes(EyeObservation {
            left_open_probability: Some(0.1),
            right_open_probability: None,
            captured_at: now,
        });
        assert_eq!(machine.on_observation(&one_eye, now), Transition::ExitedAlert);
        assert_eq!(machine.on_observation(&FrameInput::NoFace, now), Transition::NoChange);
    }

    #[test]
    fn test_nan_probability_reads_as_open() {
        let mut machine = DrowsinessStateMachine::new(DetectionConfig::default());
        let mut now = start_at(12);

        feed(&mut machine, &mut now, 4, 0.1, 0.1);
        feed(&mut machine, &mut now, 1, f32::NAN, 0.1);
        assert_eq!(machine.state().closed_eye_run, 0);
    }

    #[test]
    fn test_retrigger_interval_suppresses_quick_realert() {
        let mut machine = DrowsinessStateMachine::new(DetectionConfig::default());
        let mut now = start_at(12);

        feed(&mut machine, &mut now, 8, 0.1, 0.1);
        feed(&mut machine, &mut now, 1, 0.9, 0.9);

        // Second run crosses the threshold ~0.6s after the first alert
        let transitions = feed(&mut machine, &mut now, 12, 0.1, 0.1);
        assert!(!transitions.contains(&Transition::EnteredAlert));
        assert!(!machine.state().is_alerting);

        // A fresh run after the interval alerts again
        feed(&mut machine, &mut now, 1, 0.9, 0.9);
        now = now.advanced_by(Duration::from_secs(3));
        let transitions = feed(&mut machine, &mut now, 8, 0.1, 0.1);
        assert_eq!(transitions[7], Transition::EnteredAlert);
    }

    #[test]
    fn test_rearm_while_closed_fires_after_interval() {
        let config = DetectionConfig {
            rearm_while_closed: true,
            ..Default::default()
        };
        let mut machine = DrowsinessStateMachine::new(config);
        let mut now = start_at(12);

        feed(&mut machine, &mut now, 8, 0.1, 0.1);
        feed(&mut machine, &mut now, 1, 0.9, 0.9);

        // 50 frames * 66ms = 3.3s, so the suppressed crossing fires mid-run
        let transitions = feed(&mut machine, &mut now, 50, 0.1, 0.1);
        let entered: Vec<_> = transitions
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == Transition::EnteredAlert)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(entered.len(), 1);
        assert!(entered[0] > 7);
    }

    #[test]
    fn test_reset_keeps_last_alert_time() {
        let mut machine = DrowsinessStateMachine::new(DetectionConfig::default());
        let mut now = start_at(12);

        feed(&mut machine, &mut now, 8, 0.1, 0.1);
        machine.reset();

        assert_eq!(machine.state().closed_eye_run, 0);
        assert!(!machine.state().is_alerting);
        assert!(machine.state().last_alert_at.is_some());
    }

    #[test]
    fn test_step_is_pure() {
        let config = DetectionConfig::default();
        let now = start_at(12);
        let state = EngineState {
            closed_eye_run: 7,
            ..Default::default()
        };
        let input = eyes(0.1, 0.1, now);

        let first = step(&config, state, &input, now);
        let second = step(&config, state, &input, now);
        assert_eq!(first, second);
        assert_eq!(first.1, Transition::EnteredAlert);
    }
}
