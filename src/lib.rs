//! Gripcatch Engine - Gesture-driven capture game for hand rehabilitation.
//!
//! This library turns a stream of 21-point hand landmark frames into a
//! timed "catch the creature" training session: clench a fist over the
//! creature, hold it for a second, and the creature is carried to the
//! basket. Scores are reported to a therapy progress backend when the
//! session ends.
//!
//! # Privacy Guarantees
//!
//! - **No video**: The engine consumes landmark geometry only, never frames
//! - **No storage**: Landmark frames are discarded after classification
//! - **Minimal reporting**: Only score, level and duration leave the device
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Gripcatch Engine                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Landmarks  │──▶│    Fist     │──▶│    Hold     │       │
//! │  │  (21-point) │   │ (5 tests)   │   │  (1s timer) │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         │                                    │              │
//! │         ▼                                    ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐       │
//! │  │  Creature   │◀────────────────────│   Session   │       │
//! │  │ (one slot)  │                     │ (180s game) │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use gripcatch_engine::config::GameConfig;
//! use gripcatch_engine::game::{SessionController, Viewport};
//! use rand::rngs::SmallRng;
//! use rand::SeedableRng;
//!
//! let config = GameConfig::default();
//! let viewport = Viewport {
//!     width: config.viewport_width,
//!     height: config.viewport_height,
//! };
//! let mut session = SessionController::new(&config, viewport, SmallRng::seed_from_u64(7))
//!     .expect("default config is valid");
//! session.start();
//! ```

pub mod backend;
pub mod config;
pub mod game;
pub mod hand;
pub mod sequencer;
pub mod sim;

// Re-export key types at crate root for convenience
pub use backend::{ApiConfig, BackendError, NullBackend, ProgressBackend, TrainingRecord};
pub use config::{BackendSettings, ConfigError, GameConfig};
pub use game::{
    CreatureController, CreatureEvent, CreatureState, GameEvent, SessionController, SessionError,
    SessionPhase, SessionReport, SessionRunner, SpawnDirection, Viewport,
};
pub use hand::{ClassificationFeed, FistClassifier, GestureEvent, HandFrame, HoldTracker, Landmark};
pub use sequencer::{EndOfSessionSequencer, SequenceOutcome};

// HTTP client re-exports (when enabled)
#[cfg(feature = "http")]
pub use backend::{ApiClient, BlockingApiClient};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║            GRIPCATCH ENGINE - PRIVACY DECLARATION                ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This engine drives a hand-rehabilitation capture game.          ║
║                                                                  ║
║  ✓ WHAT WE PROCESS:                                              ║
║    • 21-point hand landmark positions (geometry only)            ║
║    • Fist hold timing (when a clench starts and ends)            ║
║    • Session score, level and duration                           ║
║                                                                  ║
║  ✗ WHAT WE NEVER PROCESS OR STORE:                               ║
║    • Camera frames or any video                                  ║
║    • Anything identifying the hand's owner                       ║
║    • Landmark history beyond the current frame                   ║
║                                                                  ║
║  All classification happens locally. Only the session result     ║
║  (score, level, duration) is reported to the therapy backend,    ║
║  and only when a backend is configured.                          ║
║                                                                  ║
║  You can inspect the active configuration anytime with:          ║
║    gripcatch config                                              ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privacy_declaration_contents() {
        assert!(PRIVACY_DECLARATION.contains("PRIVACY"));
        assert!(PRIVACY_DECLARATION.contains("NEVER PROCESS"));
        assert!(PRIVACY_DECLARATION.contains("Camera frames"));
    }
}
