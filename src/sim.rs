//! Simulated hand source.
//!
//! Stands in for a camera pipeline: fixed landmark poses for an open
//! and a clenched hand, plus a scripted source that alternates between
//! them on a timer. Coordinates are normalized, y grows downward, and
//! the poses are a right hand seen palm-on.

use crate::hand::landmarks::{HandFrame, Landmark};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

/// Landmarks of a relaxed open hand, fingers extended upward.
pub fn open_hand() -> Vec<Landmark> {
    vec![
        // wrist
        Landmark::new(0.50, 0.90),
        // thumb: cmc, mcp, ip, tip
        Landmark::new(0.42, 0.85),
        Landmark::new(0.36, 0.78),
        Landmark::new(0.32, 0.72),
        Landmark::new(0.29, 0.67),
        // index: mcp, pip, dip, tip
        Landmark::new(0.44, 0.62),
        Landmark::new(0.43, 0.52),
        Landmark::new(0.42, 0.45),
        Landmark::new(0.41, 0.38),
        // middle
        Landmark::new(0.50, 0.60),
        Landmark::new(0.50, 0.49),
        Landmark::new(0.50, 0.41),
        Landmark::new(0.50, 0.33),
        // ring
        Landmark::new(0.56, 0.62),
        Landmark::new(0.57, 0.52),
        Landmark::new(0.58, 0.45),
        Landmark::new(0.58, 0.38),
        // pinky
        Landmark::new(0.62, 0.65),
        Landmark::new(0.64, 0.57),
        Landmark::new(0.65, 0.52),
        Landmark::new(0.66, 0.46),
    ]
}

/// Landmarks of a clenched fist, fingertips folded back toward the palm.
pub fn clenched_hand() -> Vec<Landmark> {
    vec![
        // wrist
        Landmark::new(0.50, 0.90),
        // thumb: cmc, mcp, ip, tip
        Landmark::new(0.43, 0.84),
        Landmark::new(0.39, 0.76),
        Landmark::new(0.43, 0.68),
        Landmark::new(0.47, 0.64),
        // index: mcp, pip, dip, tip
        Landmark::new(0.44, 0.62),
        Landmark::new(0.43, 0.55),
        Landmark::new(0.45, 0.60),
        Landmark::new(0.46, 0.66),
        // middle
        Landmark::new(0.50, 0.60),
        Landmark::new(0.50, 0.52),
        Landmark::new(0.51, 0.58),
        Landmark::new(0.51, 0.65),
        // ring
        Landmark::new(0.56, 0.62),
        Landmark::new(0.57, 0.55),
        Landmark::new(0.57, 0.61),
        Landmark::new(0.56, 0.67),
        // pinky
        Landmark::new(0.62, 0.65),
        Landmark::new(0.63, 0.58),
        Landmark::new(0.63, 0.63),
        Landmark::new(0.62, 0.68),
    ]
}

/// An empty detection, as the tracker reports when no hand is in view.
pub fn absent_hand() -> Vec<Landmark> {
    Vec::new()
}

/// Scripted hand that clenches and releases on a fixed cycle.
///
/// Each emitted frame gets a little positional jitter so downstream
/// code never sees two bit-identical detections in a row.
pub struct ScriptedHand {
    clench_for: Duration,
    release_for: Duration,
    started: Instant,
    rng: SmallRng,
}

impl ScriptedHand {
    /// Create a source that clenches for `clench_for`, releases for
    /// `release_for`, and repeats.
    pub fn new(clench_for: Duration, release_for: Duration) -> Self {
        Self {
            clench_for,
            release_for,
            started: Instant::now(),
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Same cycle with a fixed seed for the jitter.
    pub fn seeded(clench_for: Duration, release_for: Duration, seed: u64) -> Self {
        Self {
            clench_for,
            release_for,
            started: Instant::now(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Build the cycle from user-supplied fractional seconds.
    ///
    /// Returns `None` when either value cannot be represented as a
    /// `Duration` or the clench phase would be zero-length.
    pub fn from_cycle_secs(clench_secs: f64, release_secs: f64) -> Option<Self> {
        let clench_for = Duration::try_from_secs_f64(clench_secs).ok()?;
        let release_for = Duration::try_from_secs_f64(release_secs).ok()?;
        if clench_for.is_zero() {
            return None;
        }
        Some(Self::new(clench_for, release_for))
    }

    fn is_clenched(&self, elapsed: Duration) -> bool {
        let cycle = self.clench_for + self.release_for;
        if cycle.is_zero() {
            return false;
        }
        let into_cycle = Duration::from_nanos((elapsed.as_nanos() % cycle.as_nanos()) as u64);
        into_cycle < self.clench_for
    }

    /// Produce the frame for the current instant.
    pub fn next_frame(&mut self) -> HandFrame {
        let base = if self.is_clenched(self.started.elapsed()) {
            clenched_hand()
        } else {
            open_hand()
        };
        let landmarks = base
            .into_iter()
            .map(|lm| {
                Landmark::new(
                    lm.x + self.rng.random_range(-0.002..0.002f32),
                    lm.y + self.rng.random_range(-0.002..0.002f32),
                )
            })
            .collect();
        HandFrame::new(landmarks)
    }
}
