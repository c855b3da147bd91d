//! Creature lifecycle: spawn geometry, travel, capture and escape.
//!
//! At most one creature is live at a time. It spawns inside the central
//! band of the viewport, runs toward a viewport edge on a fixed-duration
//! travel, and either escapes when the travel expires or is caught when
//! the player completes a confirmed clench hold.

use crate::hand::hold::GestureEvent;
use rand::rngs::SmallRng;
use rand::Rng;
use std::f32::consts::{FRAC_1_SQRT_2, SQRT_2};
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

/// Playfield dimensions in scene units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Playfield width
    pub width: f32,
    /// Playfield height
    pub height: f32,
}

/// The six travel directions a creature can spawn with.
///
/// Pure vertical travel is excluded: the sprites read poorly running
/// straight up or down, so the set is the two horizontals plus the four
/// diagonals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnDirection {
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl SpawnDirection {
    /// All spawnable directions.
    pub const ALL: [SpawnDirection; 6] = [
        SpawnDirection::Left,
        SpawnDirection::Right,
        SpawnDirection::UpLeft,
        SpawnDirection::UpRight,
        SpawnDirection::DownLeft,
        SpawnDirection::DownRight,
    ];

    /// Unit vector of this direction (y grows downward).
    pub fn unit(&self) -> (f32, f32) {
        match self {
            SpawnDirection::Left => (-1.0, 0.0),
            SpawnDirection::Right => (1.0, 0.0),
            SpawnDirection::UpLeft => (-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
            SpawnDirection::UpRight => (FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
            SpawnDirection::DownLeft => (-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
            SpawnDirection::DownRight => (FRAC_1_SQRT_2, FRAC_1_SQRT_2),
        }
    }

    /// Distance from `origin` to the viewport edge along this direction.
    ///
    /// For diagonals the nearest axis limits the run: the reachable
    /// distance is the smaller axis clearance divided by cos 45°.
    pub fn distance_to_edge(&self, origin: (f32, f32), viewport: &Viewport) -> f32 {
        let (x, y) = origin;
        match self {
            SpawnDirection::Left => x,
            SpawnDirection::Right => viewport.width - x,
            SpawnDirection::UpLeft => x.min(y) * SQRT_2,
            SpawnDirection::UpRight => (viewport.width - x).min(y) * SQRT_2,
            SpawnDirection::DownLeft => x.min(viewport.height - y) * SQRT_2,
            SpawnDirection::DownRight => (viewport.width - x).min(viewport.height - y) * SQRT_2,
        }
    }

    /// Whether a left-facing sprite must be mirrored for this direction.
    pub fn flips_sprite(&self) -> bool {
        self.unit().0 > 0.0
    }
}

/// Creature activity states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatureState {
    /// Traveling toward its target position.
    Running,
    /// Lying down while the player holds a clench.
    Laying,
    /// Being carried to the basket after a confirmed hold.
    MovingToBasket,
    /// Capture complete.
    Caught,
    /// Travel expired before a capture completed.
    Escaped,
}

/// A live creature.
#[derive(Debug, Clone)]
pub struct Creature {
    /// Unique id for renderer bookkeeping
    pub id: Uuid,
    /// Spawn position
    pub origin: (f32, f32),
    /// Travel end position
    pub target: (f32, f32),
    /// Travel direction
    pub direction: SpawnDirection,
    /// Whether the sprite is mirrored (facing right)
    pub flipped: bool,
    /// Current activity state
    pub state: CreatureState,
    /// When the creature spawned
    pub spawned_at: Instant,
    /// When the travel expires and the creature escapes
    pub travel_deadline: Instant,
    /// When the basket carry completes, once a capture has started
    pub capture_deadline: Option<Instant>,
}

/// Creature lifecycle notifications for the session layer.
#[derive(Debug, Clone, PartialEq)]
pub enum CreatureEvent {
    /// A creature entered the playfield.
    Spawned {
        id: Uuid,
        origin: (f32, f32),
        target: (f32, f32),
        direction: SpawnDirection,
        flipped: bool,
    },
    /// The creature lay down in reaction to a starting hold.
    LaidDown { id: Uuid },
    /// The hold broke early and the creature resumed running.
    GotUp { id: Uuid },
    /// A confirmed hold started the carry to the basket.
    CaptureStarted { id: Uuid },
    /// The carry completed; the creature is in the basket.
    Caught { id: Uuid },
    /// The travel expired; the creature left the playfield.
    Escaped { id: Uuid },
    /// The creature was removed when the session ended.
    Removed { id: Uuid },
}

/// Timing and geometry knobs for the creature lifecycle.
#[derive(Debug, Clone)]
pub struct CreatureConfig {
    /// Fixed travel duration; speed varies with distance
    pub travel_duration: Duration,
    /// Duration of the carry to the basket
    pub capture_duration: Duration,
    /// Fraction of the edge distance actually traveled
    pub travel_factor: f32,
    /// Spawn band margin as a fraction of each viewport axis
    pub spawn_margin: f32,
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self {
            travel_duration: Duration::from_secs(4),
            capture_duration: Duration::from_millis(1500),
            travel_factor: 0.8,
            spawn_margin: 0.2,
        }
    }
}

/// Owns the single creature slot and the capture-release gate.
///
/// Spawning is allowed only while the slot is empty *and* the release of
/// the previous capture has been observed. The gate starts open.
pub struct CreatureController {
    config: CreatureConfig,
    viewport: Viewport,
    rng: SmallRng,
    creature: Option<Creature>,
    /// A capture has started whose confirmed hold has not been released yet.
    release_pending: bool,
}

impl CreatureController {
    /// Create a controller for an already validated viewport.
    pub fn new(config: CreatureConfig, viewport: Viewport, rng: SmallRng) -> Self {
        Self {
            config,
            viewport,
            rng,
            creature: None,
            release_pending: false,
        }
    }

    /// Whether a new creature may spawn right now.
    pub fn generation_allowed(&self) -> bool {
        self.creature.is_none() && !self.release_pending
    }

    /// The live creature, if any.
    pub fn creature(&self) -> Option<&Creature> {
        self.creature.as_ref()
    }

    /// Spawn a creature if the slot is free and the gate is open.
    ///
    /// Safe to call on every watchdog tick; a blocked spawn is silently
    /// ignored.
    pub fn try_spawn(&mut self, now: Instant) -> Option<CreatureEvent> {
        if !self.generation_allowed() {
            return None;
        }

        let x_lo = self.config.spawn_margin * self.viewport.width;
        let x_hi = (1.0 - self.config.spawn_margin) * self.viewport.width;
        let y_lo = self.config.spawn_margin * self.viewport.height;
        let y_hi = (1.0 - self.config.spawn_margin) * self.viewport.height;
        let origin = (
            self.rng.random_range(x_lo..x_hi),
            self.rng.random_range(y_lo..y_hi),
        );

        let direction = SpawnDirection::ALL[self.rng.random_range(0..SpawnDirection::ALL.len())];
        let distance = direction.distance_to_edge(origin, &self.viewport) * self.config.travel_factor;
        let (ux, uy) = direction.unit();
        let target = (origin.0 + ux * distance, origin.1 + uy * distance);

        let creature = Creature {
            id: Uuid::new_v4(),
            origin,
            target,
            direction,
            flipped: direction.flips_sprite(),
            state: CreatureState::Running,
            spawned_at: now,
            travel_deadline: now + self.config.travel_duration,
            capture_deadline: None,
        };
        debug!(
            "creature {} spawned at ({:.0}, {:.0}) heading {:?}",
            creature.id, origin.0, origin.1, direction
        );

        let event = CreatureEvent::Spawned {
            id: creature.id,
            origin,
            target,
            direction,
            flipped: creature.flipped,
        };
        self.creature = Some(creature);
        Some(event)
    }

    /// React to a hold event from the gesture tracker.
    pub fn on_gesture(&mut self, event: GestureEvent, now: Instant) -> Option<CreatureEvent> {
        // A confirmed release always clears its half of the gate, whether
        // or not the captured creature has reached the basket yet.
        if event == GestureEvent::ReleasedConfirmed {
            self.release_pending = false;
        }

        let creature = self.creature.as_mut()?;
        match (event, creature.state) {
            (GestureEvent::HoldStarted, CreatureState::Running) => {
                creature.state = CreatureState::Laying;
                Some(CreatureEvent::LaidDown { id: creature.id })
            }
            (GestureEvent::ReleasedEarly, CreatureState::Laying) => {
                creature.state = CreatureState::Running;
                Some(CreatureEvent::GotUp { id: creature.id })
            }
            (GestureEvent::HoldConfirmed, CreatureState::Running | CreatureState::Laying) => {
                creature.state = CreatureState::MovingToBasket;
                creature.capture_deadline = Some(now + self.config.capture_duration);
                self.release_pending = true;
                debug!("creature {} capture started", creature.id);
                Some(CreatureEvent::CaptureStarted { id: creature.id })
            }
            _ => None,
        }
    }

    /// Advance deadline-driven transitions.
    ///
    /// Travel expiry is evaluated only while the creature is Running; a
    /// hold in progress defers the evaluation, not the deadline.
    pub fn poll(&mut self, now: Instant) -> Option<CreatureEvent> {
        let creature = self.creature.as_mut()?;
        match creature.state {
            CreatureState::Running if now >= creature.travel_deadline => {
                let id = creature.id;
                debug!("creature {id} escaped");
                self.creature = None;
                Some(CreatureEvent::Escaped { id })
            }
            CreatureState::MovingToBasket => {
                let deadline = creature.capture_deadline?;
                if now >= deadline {
                    let id = creature.id;
                    debug!("creature {id} caught");
                    self.creature = None;
                    Some(CreatureEvent::Caught { id })
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Remove the live creature without a capture or escape (session end).
    pub fn discard(&mut self) -> Option<CreatureEvent> {
        let creature = self.creature.take()?;
        Some(CreatureEvent::Removed { id: creature.id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn controller() -> CreatureController {
        CreatureController::new(
            CreatureConfig::default(),
            Viewport {
                width: 1000.0,
                height: 800.0,
            },
            SmallRng::seed_from_u64(7),
        )
    }

    fn spawned(controller: &mut CreatureController, now: Instant) -> Uuid {
        match controller.try_spawn(now) {
            Some(CreatureEvent::Spawned { id, .. }) => id,
            other => panic!("expected spawn, got {other:?}"),
        }
    }

    #[test]
    fn test_single_slot_blocks_respawn() {
        let mut c = controller();
        let t0 = Instant::now();

        assert!(c.generation_allowed());
        spawned(&mut c, t0);
        assert!(!c.generation_allowed());
        assert!(c.try_spawn(t0).is_none());
    }

    #[test]
    fn test_capture_flow_and_release_gate() {
        let mut c = controller();
        let t0 = Instant::now();
        let id = spawned(&mut c, t0);

        assert_eq!(
            c.on_gesture(GestureEvent::HoldStarted, t0),
            Some(CreatureEvent::LaidDown { id })
        );
        assert_eq!(c.creature().map(|cr| cr.state), Some(CreatureState::Laying));

        let confirm_at = t0 + Duration::from_secs(1);
        assert_eq!(
            c.on_gesture(GestureEvent::HoldConfirmed, confirm_at),
            Some(CreatureEvent::CaptureStarted { id })
        );

        // Carry still in progress
        assert_eq!(c.poll(confirm_at + Duration::from_millis(1400)), None);

        // Carry complete: slot frees but the gate stays shut on the release
        assert_eq!(
            c.poll(confirm_at + Duration::from_millis(1500)),
            Some(CreatureEvent::Caught { id })
        );
        assert!(!c.generation_allowed());

        assert_eq!(
            c.on_gesture(GestureEvent::ReleasedConfirmed, confirm_at + Duration::from_secs(2)),
            None
        );
        assert!(c.generation_allowed());
    }

    #[test]
    fn test_release_before_arrival_also_opens_gate() {
        let mut c = controller();
        let t0 = Instant::now();
        spawned(&mut c, t0);

        c.on_gesture(GestureEvent::HoldStarted, t0);
        c.on_gesture(GestureEvent::HoldConfirmed, t0 + Duration::from_secs(1));

        // Player opens the hand while the carry is still running
        c.on_gesture(
            GestureEvent::ReleasedConfirmed,
            t0 + Duration::from_millis(1200),
        );
        assert!(!c.generation_allowed(), "creature still occupies the slot");

        assert!(matches!(
            c.poll(t0 + Duration::from_millis(2500)),
            Some(CreatureEvent::Caught { .. })
        ));
        assert!(c.generation_allowed());
    }

    #[test]
    fn test_early_release_resumes_running() {
        let mut c = controller();
        let t0 = Instant::now();
        let id = spawned(&mut c, t0);

        c.on_gesture(GestureEvent::HoldStarted, t0);
        assert_eq!(
            c.on_gesture(GestureEvent::ReleasedEarly, t0 + Duration::from_millis(400)),
            Some(CreatureEvent::GotUp { id })
        );
        assert_eq!(c.creature().map(|cr| cr.state), Some(CreatureState::Running));
        assert!(!c.generation_allowed(), "early release never opens the gate");
    }

    #[test]
    fn test_travel_expiry_escapes_and_opens_gate() {
        let mut c = controller();
        let t0 = Instant::now();
        let id = spawned(&mut c, t0);

        assert_eq!(c.poll(t0 + Duration::from_millis(3900)), None);
        assert_eq!(
            c.poll(t0 + Duration::from_secs(4)),
            Some(CreatureEvent::Escaped { id })
        );
        assert!(c.generation_allowed());
    }

    #[test]
    fn test_laying_defers_escape_evaluation() {
        let mut c = controller();
        let t0 = Instant::now();
        let id = spawned(&mut c, t0);

        c.on_gesture(GestureEvent::HoldStarted, t0 + Duration::from_millis(3900));

        // Deadline passes while laying: no escape
        assert_eq!(c.poll(t0 + Duration::from_millis(4100)), None);

        // The deadline itself was not extended: escape fires on resume
        c.on_gesture(GestureEvent::ReleasedEarly, t0 + Duration::from_millis(4200));
        assert_eq!(
            c.poll(t0 + Duration::from_millis(4200)),
            Some(CreatureEvent::Escaped { id })
        );
    }

    #[test]
    fn test_targets_stay_in_bounds_for_all_directions() {
        let viewport = Viewport {
            width: 1000.0,
            height: 800.0,
        };
        let factor = 0.8;
        // Corners and center of the 20-80% spawn band
        let origins = [
            (200.0, 160.0),
            (800.0, 160.0),
            (200.0, 640.0),
            (800.0, 640.0),
            (500.0, 400.0),
        ];

        for origin in origins {
            for direction in SpawnDirection::ALL {
                let distance = direction.distance_to_edge(origin, &viewport) * factor;
                let (ux, uy) = direction.unit();
                let target = (origin.0 + ux * distance, origin.1 + uy * distance);

                assert!(
                    target.0 >= 0.0 && target.0 <= viewport.width,
                    "{direction:?} from {origin:?} leaves x bounds: {target:?}"
                );
                assert!(
                    target.1 >= 0.0 && target.1 <= viewport.height,
                    "{direction:?} from {origin:?} leaves y bounds: {target:?}"
                );
            }
        }
    }

    #[test]
    fn test_diagonal_edge_distance() {
        let viewport = Viewport {
            width: 1000.0,
            height: 800.0,
        };
        // Nearest axis (y = 50) limits the run
        let d = SpawnDirection::UpLeft.distance_to_edge((100.0, 50.0), &viewport);
        assert!((d - 50.0 * SQRT_2).abs() < 1e-3);

        let d = SpawnDirection::DownRight.distance_to_edge((900.0, 100.0), &viewport);
        assert!((d - 100.0 * SQRT_2).abs() < 1e-3);
    }

    #[test]
    fn test_sprite_flip_faces_right() {
        assert!(SpawnDirection::Right.flips_sprite());
        assert!(SpawnDirection::UpRight.flips_sprite());
        assert!(SpawnDirection::DownRight.flips_sprite());
        assert!(!SpawnDirection::Left.flips_sprite());
        assert!(!SpawnDirection::UpLeft.flips_sprite());
        assert!(!SpawnDirection::DownLeft.flips_sprite());
    }

    #[test]
    fn test_spawn_positions_inside_band() {
        let mut c = controller();
        for _ in 0..50 {
            let t = Instant::now();
            if let Some(CreatureEvent::Spawned { origin, .. }) = c.try_spawn(t) {
                assert!(origin.0 >= 200.0 && origin.0 <= 800.0, "x = {}", origin.0);
                assert!(origin.1 >= 160.0 && origin.1 <= 640.0, "y = {}", origin.1);
            }
            // Free the slot for the next round
            c.poll(t + Duration::from_secs(5));
        }
    }
}
