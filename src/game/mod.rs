//! Game state machines and the serialized session loop.

pub mod creature;
pub mod runner;
pub mod session;

// Re-export commonly used types
pub use creature::{
    Creature, CreatureConfig, CreatureController, CreatureEvent, CreatureState, SpawnDirection,
    Viewport,
};
pub use runner::SessionRunner;
pub use session::{
    GameEvent, SessionController, SessionError, SessionPhase, SessionReport,
};
