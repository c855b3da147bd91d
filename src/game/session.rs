//! Session phase machine: countdown, game clock and scoring.
//!
//! A session walks Idle → Countdown → Active → Ended exactly once and
//! always runs to time expiry; reaching the target early raises the
//! score but never shortens the session. All mutation happens through
//! the owning loop thread, with explicit `now` timestamps so tests can
//! drive time synthetically.

use crate::config::GameConfig;
use crate::game::creature::{CreatureConfig, CreatureController, CreatureEvent, Viewport};
use crate::hand::fist::FistClassifier;
use crate::hand::hold::HoldTracker;
use crate::hand::landmarks::HandFrame;
use chrono::{DateTime, Utc};
use rand::rngs::SmallRng;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Session lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Constructed but not started.
    Idle,
    /// Pre-game countdown is running.
    Countdown,
    /// The game clock is running.
    Active,
    /// The session is over.
    Ended,
}

/// Session construction errors.
#[derive(Debug)]
pub enum SessionError {
    /// The viewport cannot host spawn geometry.
    InvalidViewport { width: f32, height: f32 },
    /// The configuration fails its own validation.
    InvalidConfig(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidViewport { width, height } => {
                write!(f, "Invalid viewport: {width}x{height}")
            }
            SessionError::InvalidConfig(reason) => write!(f, "{reason}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Final result of a completed session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    /// Session identifier
    pub session_id: Uuid,
    /// Creatures caught
    pub caught: u32,
    /// Captures required for a successful session
    pub target: u32,
    /// Whether the target was reached by time expiry
    pub success: bool,
    /// Seconds the active phase lasted
    pub active_secs: u64,
    /// Wall-clock end time
    pub ended_at: DateTime<Utc>,
}

/// Renderer-facing notifications, drained via
/// [`SessionController::take_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A countdown digit to show.
    CountdownTick(u32),
    /// The active phase began.
    Started { remaining_secs: u64 },
    /// A creature lifecycle notification.
    Creature(CreatureEvent),
    /// The capture count changed.
    ScoreChanged { caught: u32, target: u32 },
    /// One second elapsed on the game clock.
    RemainingChanged { secs: u64 },
    /// The session ended.
    Ended(SessionReport),
}

/// Drives one capture session from countdown to report.
pub struct SessionController {
    session_id: Uuid,
    phase: SessionPhase,
    countdown_start: u32,
    countdown_remaining: u32,
    session_duration_secs: u64,
    remaining_secs: u64,
    active_secs: u64,
    caught: u32,
    target: u32,
    classifier: FistClassifier,
    tracker: HoldTracker,
    creatures: CreatureController,
    events: Vec<GameEvent>,
    report: Option<SessionReport>,
}

impl SessionController {
    /// Create an idle session for the given playfield.
    ///
    /// The configuration and viewport are validated up front; a session
    /// that constructs can always spawn.
    pub fn new(
        config: &GameConfig,
        viewport: Viewport,
        rng: SmallRng,
    ) -> Result<Self, SessionError> {
        if !viewport.width.is_finite()
            || !viewport.height.is_finite()
            || viewport.width <= 0.0
            || viewport.height <= 0.0
        {
            return Err(SessionError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        config
            .validate()
            .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;

        let creature_config = CreatureConfig {
            travel_duration: config.travel_duration,
            capture_duration: config.capture_duration,
            travel_factor: config.travel_factor,
            spawn_margin: config.spawn_margin,
        };

        Ok(Self {
            session_id: Uuid::new_v4(),
            phase: SessionPhase::Idle,
            countdown_start: config.countdown_start,
            countdown_remaining: 0,
            session_duration_secs: config.session_duration.as_secs(),
            remaining_secs: 0,
            active_secs: 0,
            caught: 0,
            target: config.target_count,
            classifier: FistClassifier::default(),
            tracker: HoldTracker::new(config.hold_threshold),
            creatures: CreatureController::new(creature_config, viewport, rng),
            events: Vec::new(),
            report: None,
        })
    }

    /// Begin the countdown. Emits the first digit; later digits come
    /// from the 1 Hz countdown tick. No-op unless the session is idle.
    pub fn start(&mut self) {
        if self.phase != SessionPhase::Idle {
            return;
        }
        self.phase = SessionPhase::Countdown;
        self.countdown_remaining = self.countdown_start;
        info!("session {} countdown started", self.session_id);
        self.events
            .push(GameEvent::CountdownTick(self.countdown_remaining));
    }

    /// Advance the countdown by one second.
    ///
    /// The tick after digit 1 enters the active phase; there is no zero
    /// digit.
    pub fn tick_countdown(&mut self, now: Instant) {
        if self.phase != SessionPhase::Countdown {
            return;
        }
        if self.countdown_remaining > 1 {
            self.countdown_remaining -= 1;
            self.events
                .push(GameEvent::CountdownTick(self.countdown_remaining));
        } else {
            self.enter_active(now);
        }
    }

    /// Advance the game clock by one second. Ends the session when the
    /// clock reaches zero.
    pub fn tick_clock(&mut self, _now: Instant) {
        if self.phase != SessionPhase::Active {
            return;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.active_secs += 1;
        self.events.push(GameEvent::RemainingChanged {
            secs: self.remaining_secs,
        });
        if self.remaining_secs == 0 {
            self.end();
        }
    }

    /// Spawn watchdog tick: restock the playfield if the slot is free
    /// and the capture-release gate is open.
    pub fn tick_watchdog(&mut self, now: Instant) {
        if self.phase != SessionPhase::Active {
            return;
        }
        if let Some(event) = self.creatures.try_spawn(now) {
            self.absorb(event);
        }
    }

    /// Classify one landmark frame and route any resulting hold event.
    ///
    /// Frames outside the active phase are ignored.
    pub fn on_frame(&mut self, frame: &HandFrame, now: Instant) {
        if self.phase != SessionPhase::Active {
            return;
        }
        let clenched = self.classifier.classify(&frame.landmarks);
        if let Some(gesture) = self.tracker.update(clenched, now) {
            debug!("hold event: {gesture:?}");
            if let Some(event) = self.creatures.on_gesture(gesture, now) {
                self.absorb(event);
            }
        }
    }

    /// Advance deadline-driven creature transitions. Called every loop
    /// iteration; cheap when nothing is due.
    pub fn poll(&mut self, now: Instant) {
        if self.phase != SessionPhase::Active {
            return;
        }
        if let Some(event) = self.creatures.poll(now) {
            self.absorb(event);
        }
    }

    /// Get and remove queued renderer events.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Get and remove the final report. Returns `Some` exactly once,
    /// after the session has ended.
    pub fn take_report(&mut self) -> Option<SessionReport> {
        self.report.take()
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Seconds left on the game clock.
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// Creatures caught so far.
    pub fn caught_count(&self) -> u32 {
        self.caught
    }

    /// Captures required for success.
    pub fn target_count(&self) -> u32 {
        self.target
    }

    /// Whether a new creature may spawn right now.
    pub fn generation_allowed(&self) -> bool {
        self.creatures.generation_allowed()
    }

    /// Session identifier.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    fn enter_active(&mut self, now: Instant) {
        self.phase = SessionPhase::Active;
        self.remaining_secs = self.session_duration_secs;
        info!(
            "session {} active: {}s on the clock",
            self.session_id, self.remaining_secs
        );
        self.events.push(GameEvent::Started {
            remaining_secs: self.remaining_secs,
        });
        // First creature right away; the watchdog keeps the field
        // stocked from here on.
        if let Some(event) = self.creatures.try_spawn(now) {
            self.absorb(event);
        }
    }

    fn absorb(&mut self, event: CreatureEvent) {
        let caught = matches!(event, CreatureEvent::Caught { .. });
        self.events.push(GameEvent::Creature(event));
        if caught {
            self.caught += 1;
            self.events.push(GameEvent::ScoreChanged {
                caught: self.caught,
                target: self.target,
            });
        }
    }

    fn end(&mut self) {
        self.phase = SessionPhase::Ended;
        if let Some(event) = self.creatures.discard() {
            self.events.push(GameEvent::Creature(event));
        }
        self.tracker.reset();

        let report = SessionReport {
            session_id: self.session_id,
            caught: self.caught,
            target: self.target,
            success: self.caught >= self.target,
            active_secs: self.active_secs,
            ended_at: Utc::now(),
        };
        info!(
            "session {} ended: {}/{} caught, success = {}",
            self.session_id, report.caught, report.target, report.success
        );
        self.events.push(GameEvent::Ended(report.clone()));
        self.report = Some(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim;
    use rand::SeedableRng;
    use std::time::Duration;

    fn viewport() -> Viewport {
        Viewport {
            width: 1000.0,
            height: 800.0,
        }
    }

    fn controller(config: &GameConfig) -> SessionController {
        SessionController::new(config, viewport(), SmallRng::seed_from_u64(42)).unwrap()
    }

    /// Drive a fresh session through the countdown into the active phase.
    fn activate(session: &mut SessionController, t0: Instant) {
        session.start();
        for i in 1..=3 {
            session.tick_countdown(t0 + Duration::from_secs(i));
        }
        assert_eq!(session.phase(), SessionPhase::Active);
    }

    #[test]
    fn test_zero_viewport_is_rejected() {
        let config = GameConfig::default();
        let bad = Viewport {
            width: 0.0,
            height: 600.0,
        };
        let result = SessionController::new(&config, bad, SmallRng::seed_from_u64(1));
        assert!(matches!(
            result,
            Err(SessionError::InvalidViewport { .. })
        ));
    }

    #[test]
    fn test_invalid_spawn_geometry_is_rejected() {
        // A margin of 0.6 leaves no spawn band at all; construction must
        // fail instead of letting the first spawn blow up.
        let mut config = GameConfig::default();
        config.spawn_margin = 0.6;
        assert!(config.validate().is_err());
        assert!(matches!(
            SessionController::new(&config, viewport(), SmallRng::seed_from_u64(1)),
            Err(SessionError::InvalidConfig(_))
        ));

        let mut config = GameConfig::default();
        config.travel_factor = 1.5;
        assert!(matches!(
            SessionController::new(&config, viewport(), SmallRng::seed_from_u64(1)),
            Err(SessionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_countdown_digits_then_active() {
        let config = GameConfig::default();
        let mut session = controller(&config);
        let t0 = Instant::now();

        session.start();
        assert_eq!(session.take_events(), vec![GameEvent::CountdownTick(3)]);

        session.tick_countdown(t0 + Duration::from_secs(1));
        session.tick_countdown(t0 + Duration::from_secs(2));
        assert_eq!(
            session.take_events(),
            vec![GameEvent::CountdownTick(2), GameEvent::CountdownTick(1)]
        );
        assert_eq!(session.phase(), SessionPhase::Countdown);

        session.tick_countdown(t0 + Duration::from_secs(3));
        let events = session.take_events();
        assert_eq!(
            events[0],
            GameEvent::Started {
                remaining_secs: 180
            }
        );
        assert!(
            matches!(
                events[1],
                GameEvent::Creature(CreatureEvent::Spawned { .. })
            ),
            "active phase opens with a creature, got {events:?}"
        );
        assert_eq!(session.phase(), SessionPhase::Active);
        assert_eq!(session.remaining_secs(), 180);
    }

    #[test]
    fn test_start_is_idempotent() {
        let config = GameConfig::default();
        let mut session = controller(&config);

        session.start();
        session.start();
        assert_eq!(session.take_events(), vec![GameEvent::CountdownTick(3)]);
    }

    #[test]
    fn test_frames_ignored_outside_active_phase() {
        let config = GameConfig::default();
        let mut session = controller(&config);
        let t0 = Instant::now();

        session.start();
        session.take_events();

        // Clenching during the countdown must not seed a hold
        let frame = HandFrame::at(sim::clenched_hand(), t0);
        session.on_frame(&frame, t0);
        assert!(session.take_events().is_empty());

        for i in 1..=3 {
            session.tick_countdown(t0 + Duration::from_secs(i));
        }
        session.take_events();

        // The first clenched frame in the active phase starts a fresh hold
        let t_active = t0 + Duration::from_secs(4);
        session.on_frame(&HandFrame::at(sim::clenched_hand(), t_active), t_active);
        let events = session.take_events();
        assert!(
            matches!(
                events.first(),
                Some(GameEvent::Creature(CreatureEvent::LaidDown { .. }))
            ),
            "expected a fresh hold to lay the creature down, got {events:?}"
        );
    }

    #[test]
    fn test_clock_runs_to_expiry_and_ends_once() {
        let mut config = GameConfig::default();
        config.session_duration = Duration::from_secs(3);
        let mut session = controller(&config);
        let t0 = Instant::now();
        activate(&mut session, t0);
        session.take_events();

        for i in 1..=3 {
            session.tick_clock(t0 + Duration::from_secs(3 + i));
        }
        assert_eq!(session.phase(), SessionPhase::Ended);

        let events = session.take_events();
        let ended: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Ended(_)))
            .collect();
        assert_eq!(ended.len(), 1);

        let report = session.take_report().unwrap();
        assert_eq!(report.caught, 0);
        assert!(!report.success);
        assert_eq!(report.active_secs, 3);
        assert!(session.take_report().is_none(), "report is taken once");

        // Ticks after the end are no-ops
        session.tick_clock(t0 + Duration::from_secs(10));
        session.tick_watchdog(t0 + Duration::from_secs(10));
        assert!(session.take_events().is_empty());
    }

    #[test]
    fn test_capture_increments_score() {
        let config = GameConfig::default();
        let mut session = controller(&config);
        let t0 = Instant::now();
        activate(&mut session, t0);
        session.take_events();

        let t_active = t0 + Duration::from_secs(3);
        // Sustain a clench past the hold threshold at 50ms cadence
        for i in 0..=24 {
            let now = t_active + Duration::from_millis(i * 50);
            session.on_frame(&HandFrame::at(sim::clenched_hand(), now), now);
        }
        let events = session.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::Creature(CreatureEvent::LaidDown { .. }))));
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::Creature(CreatureEvent::CaptureStarted { .. }))));

        // Carry completes 1.5s after the confirm (which fired at +1.0s)
        session.poll(t_active + Duration::from_millis(2500));
        let events = session.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::Creature(CreatureEvent::Caught { .. }))));
        assert!(events
            .iter()
            .any(|e| *e == GameEvent::ScoreChanged { caught: 1, target: 10 }));
        assert_eq!(session.caught_count(), 1);

        // The gate stays shut until the hold is released
        assert!(!session.generation_allowed());
        let t_release = t_active + Duration::from_millis(2600);
        session.on_frame(&HandFrame::at(sim::open_hand(), t_release), t_release);
        assert!(session.generation_allowed());
    }

    #[test]
    fn test_watchdog_respects_single_slot() {
        let config = GameConfig::default();
        let mut session = controller(&config);
        let t0 = Instant::now();
        activate(&mut session, t0);
        session.take_events();

        // Creature already on the field: watchdog ticks must not spawn
        for i in 0..5 {
            session.tick_watchdog(t0 + Duration::from_secs(4 + i));
        }
        assert!(session.take_events().is_empty());
    }
}
