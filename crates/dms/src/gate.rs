//! Single-flight frame gate
//!
//! At most one frame is analyzed at a time. Frames arriving while the gate is
//! busy are dropped, never queued: a stale eye-state decision is worse than a
//! missing one and the detector cannot be slowed down.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Busy flag guarding the analysis path
#[derive(Debug, Default)]
pub struct FrameGate {
    busy: AtomicBool,
}

/// Proof of admission; releases the gate when dropped
#[derive(Debug)]
#[must_use = "the gate is released as soon as the permit is dropped"]
pub struct GatePermit<'a> {
    gate: &'a FrameGate,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a frame if no other frame is in flight
    pub fn try_acquire(&self) -> Option<GatePermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GatePermit { gate: self })
    }

    /// Run `process` on `input` if admitted. Returns whether it was admitted.
    pub fn submit<T, F>(&self, input: T, process: F) -> bool
    where
        F: FnOnce(T),
    {
        match self.try_acquire() {
            Some(_permit) => {
                process(input);
                true
            }
            None => {
                debug!("Frame dropped, analysis already in flight");
                false
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for GatePermit<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Barrier};

    #[test]
    fn test_second_submit_is_dropped_while_busy() {
        let gate = FrameGate::new();

        let permit = gate.try_acquire();
        assert!(permit.is_some());
        assert!(gate.is_busy());

        let mut processed = false;
        assert!(!gate.submit((), |_| processed = true));
        assert!(!processed);

        drop(permit);
        assert!(!gate.is_busy());
        assert!(gate.submit((), |_| processed = true));
        assert!(processed);
    }

    #[test]
    fn test_nested_submit_is_dropped() {
        let gate = FrameGate::new();
        let mut inner_admitted = true;

        assert!(gate.submit((), |_| {
            inner_admitted = gate.submit((), |_| {});
        }));
        assert!(!inner_admitted);
        assert!(!gate.is_busy());
    }

    #[test]
    fn test_released_after_panic() {
        let gate = FrameGate::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            gate.submit((), |_| panic!("analysis failed"));
        }));
        assert!(result.is_err());
        assert!(!gate.is_busy());
    }

    #[test]
    fn test_exactly_one_concurrent_admission() {
        let gate = Arc::new(FrameGate::new());
        let admitted = Arc::new(AtomicUsize::new(0));
        let threads = 8;
        let start = Arc::new(Barrier::new(threads));
        let hold = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let gate = gate.clone();
                let admitted = admitted.clone();
                let start = start.clone();
                let hold = hold.clone();
                std::thread::spawn(move || {
                    start.wait();
                    let permit = gate.try_acquire();
                    if permit.is_some() {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                    // Keep the permit alive until every thread has tried
                    hold.wait();
                    drop(permit);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(admitted.load(Ordering::SeqCst), 1);
        assert!(!gate.is_busy());
    }
}
