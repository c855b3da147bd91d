//! Configuration for the capture engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the capture engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Length of the active phase
    #[serde(with = "duration_serde")]
    pub session_duration: Duration,

    /// First digit of the pre-game countdown
    pub countdown_start: u32,

    /// Captures required for a successful session
    pub target_count: u32,

    /// How long a fist must be held before it confirms
    #[serde(with = "duration_serde")]
    pub hold_threshold: Duration,

    /// How long a creature travels before it escapes
    #[serde(with = "duration_serde")]
    pub travel_duration: Duration,

    /// How long the carry to the basket takes
    #[serde(with = "duration_serde")]
    pub capture_duration: Duration,

    /// Fraction of the distance to the viewport edge a creature covers
    pub travel_factor: f32,

    /// Margin excluded from the spawn band on every side
    pub spawn_margin: f32,

    /// Playfield width in logical pixels
    pub viewport_width: f32,

    /// Playfield height in logical pixels
    pub viewport_height: f32,

    /// Training kind reported to the progress backend
    pub training_kind: String,

    /// Level being played
    pub current_level: u32,

    /// Progress backend connection, absent for offline play
    pub backend: Option<BackendSettings>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            session_duration: Duration::from_secs(180),
            countdown_start: 3,
            target_count: 10,
            hold_threshold: Duration::from_secs(1),
            travel_duration: Duration::from_secs(4),
            capture_duration: Duration::from_millis(1500),
            travel_factor: 0.8,
            spawn_margin: 0.2,
            viewport_width: 1920.0,
            viewport_height: 1080.0,
            training_kind: crate::backend::CATCH_TRAINING.to_string(),
            current_level: 1,
            backend: None,
        }
    }
}

impl GameConfig {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: GameConfig = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gripcatch-engine")
            .join("config.json")
    }

    /// Check the values a session cannot be built from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_duration < Duration::from_secs(1) {
            return Err(ConfigError::Invalid(
                "session_duration must be at least one second".to_string(),
            ));
        }
        if self.countdown_start == 0 {
            return Err(ConfigError::Invalid(
                "countdown_start must be at least 1".to_string(),
            ));
        }
        if self.target_count == 0 {
            return Err(ConfigError::Invalid(
                "target_count must be at least 1".to_string(),
            ));
        }
        if self.hold_threshold.is_zero() {
            return Err(ConfigError::Invalid(
                "hold_threshold must be positive".to_string(),
            ));
        }
        if !(self.travel_factor > 0.0 && self.travel_factor <= 1.0) {
            return Err(ConfigError::Invalid(
                "travel_factor must be in (0, 1]".to_string(),
            ));
        }
        if !(self.spawn_margin >= 0.0 && self.spawn_margin < 0.5) {
            return Err(ConfigError::Invalid(
                "spawn_margin must be in [0, 0.5)".to_string(),
            ));
        }
        if !(self.viewport_width.is_finite() && self.viewport_width > 0.0)
            || !(self.viewport_height.is_finite() && self.viewport_height > 0.0)
        {
            return Err(ConfigError::Invalid(
                "viewport dimensions must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Progress backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL of the therapy backend
    pub base_url: String,
    /// Bearer authentication token
    pub token: String,
    /// Per-request timeout (in seconds)
    pub timeout_secs: u64,
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as fractional seconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
