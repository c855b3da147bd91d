//! Debounced clench-hold tracking.
//!
//! Per-frame fist verdicts are noisy on their own; gameplay reacts to
//! *holds*. The tracker turns the boolean stream into four edge events:
//! a hold starts on the first clenched frame, confirms once it has been
//! sustained for the threshold, and releases either early or confirmed.

use std::time::{Duration, Instant};

/// Events emitted by the hold tracker, at most one per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    /// The hand just clenched.
    HoldStarted,
    /// The clench has been sustained past the hold threshold.
    HoldConfirmed,
    /// The hand opened before the threshold was reached.
    ReleasedEarly,
    /// The hand opened after the hold was confirmed.
    ReleasedConfirmed,
}

/// Current hold phase.
#[derive(Debug, Clone, Copy)]
enum HoldPhase {
    Released,
    Holding { since: Instant, confirmed: bool },
}

/// Tracks clench holds over a stream of per-frame verdicts.
///
/// An undetermined frame (no hand detected) must be fed as `false`;
/// losing the hand is indistinguishable from opening it.
#[derive(Debug)]
pub struct HoldTracker {
    threshold: Duration,
    phase: HoldPhase,
}

impl HoldTracker {
    /// Create a tracker confirming holds after `threshold`.
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            phase: HoldPhase::Released,
        }
    }

    /// Feed one frame's verdict and return the resulting event, if any.
    ///
    /// Confirmation fires exactly once per hold: the first frame at or
    /// past the threshold wins and later frames of the same hold are
    /// silent until release.
    pub fn update(&mut self, clenched: bool, now: Instant) -> Option<GestureEvent> {
        match (self.phase, clenched) {
            (HoldPhase::Released, true) => {
                self.phase = HoldPhase::Holding {
                    since: now,
                    confirmed: false,
                };
                Some(GestureEvent::HoldStarted)
            }
            (HoldPhase::Released, false) => None,
            (HoldPhase::Holding { since, confirmed }, true) => {
                if !confirmed && now.duration_since(since) >= self.threshold {
                    self.phase = HoldPhase::Holding {
                        since,
                        confirmed: true,
                    };
                    Some(GestureEvent::HoldConfirmed)
                } else {
                    None
                }
            }
            (HoldPhase::Holding { confirmed, .. }, false) => {
                self.phase = HoldPhase::Released;
                if confirmed {
                    Some(GestureEvent::ReleasedConfirmed)
                } else {
                    Some(GestureEvent::ReleasedEarly)
                }
            }
        }
    }

    /// Whether a hold is in progress.
    pub fn is_holding(&self) -> bool {
        matches!(self.phase, HoldPhase::Holding { .. })
    }

    /// Whether the current hold has been confirmed.
    pub fn is_confirmed(&self) -> bool {
        matches!(
            self.phase,
            HoldPhase::Holding {
                confirmed: true,
                ..
            }
        )
    }

    /// Discard any hold in progress without emitting a release.
    pub fn reset(&mut self) {
        self.phase = HoldPhase::Released;
    }
}
