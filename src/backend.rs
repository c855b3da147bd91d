//! Therapy progress backend port and HTTP client.
//!
//! The engine only assumes three idempotent operations: record a
//! training result, move the player's current level, and refresh the
//! sign-in. [`ProgressBackend`] is the seam; the HTTP client behind the
//! `http` feature is one implementation, [`NullBackend`] another.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use tracing::debug;

/// Training exercise identifier for the capture game.
pub const CATCH_TRAINING: &str = "catch_the_animal";

/// One completed (or unlocked) training, as reported to the backend.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingRecord {
    /// Training exercise identifier
    pub kind: String,
    /// Level the record belongs to
    pub level: u32,
    /// Captures achieved (zero for an unlock watermark)
    pub score: u32,
    /// Seconds of active play behind the score
    pub duration_secs: u64,
    /// Wall-clock time of the record (RFC3339)
    pub recorded_at: DateTime<Utc>,
    /// Device the session ran on
    pub device_id: String,
    /// Timezone of the device
    pub timezone: String,
    /// Producer metadata
    pub meta: RecordMeta,
}

/// Producer metadata attached to every record.
#[derive(Debug, Clone, Serialize)]
pub struct RecordMeta {
    /// Source identifier
    pub source: String,
    /// Version
    pub version: String,
}

impl TrainingRecord {
    /// Create a record stamped with the current wall-clock time.
    pub fn new(kind: &str, level: u32, score: u32, duration_secs: u64, device_id: &str) -> Self {
        Self {
            kind: kind.to_string(),
            level,
            score,
            duration_secs,
            recorded_at: Utc::now(),
            device_id: device_id.to_string(),
            timezone: chrono_tz::Tz::UTC.to_string(),
            meta: RecordMeta {
                source: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

/// Generate a device identifier from the hostname plus a random suffix.
pub fn device_id() -> String {
    let hostname = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    format!("grip-{}-{}", hostname, &Uuid::new_v4().to_string()[..8])
}

/// Backend error types.
#[derive(Debug)]
pub enum BackendError {
    /// Configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Server returned an error response
    Server { status: u16, message: String },
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Config(msg) => write!(f, "Backend config error: {msg}"),
            BackendError::Network(msg) => write!(f, "Backend network error: {msg}"),
            BackendError::Server { status, message } => {
                write!(f, "Backend server error ({status}): {message}")
            }
        }
    }
}

impl std::error::Error for BackendError {}

/// The progress operations the engine needs from a backend.
///
/// Implementations must tolerate repeats: the sequencer retries nothing,
/// but a caller running it twice for the same session must not corrupt
/// the stored progress.
pub trait ProgressBackend: Send {
    /// Store a training record.
    fn record_training(&self, record: &TrainingRecord) -> Result<(), BackendError>;
    /// Move the player's current level for a training kind.
    fn update_current_level(&self, kind: &str, level: u32) -> Result<(), BackendError>;
    /// Refresh the player's sign-in.
    fn sign_in(&self) -> Result<(), BackendError>;
}

/// Backend that stores nothing. Used for dry runs and as the fallback
/// when no backend is configured.
pub struct NullBackend;

impl ProgressBackend for NullBackend {
    fn record_training(&self, record: &TrainingRecord) -> Result<(), BackendError> {
        debug!(
            "dry run: record {} level {} score {}",
            record.kind, record.level, record.score
        );
        Ok(())
    }

    fn update_current_level(&self, kind: &str, level: u32) -> Result<(), BackendError> {
        debug!("dry run: current level for {kind} -> {level}");
        Ok(())
    }

    fn sign_in(&self) -> Result<(), BackendError> {
        debug!("dry run: sign in");
        Ok(())
    }
}

/// HTTP backend configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the therapy backend
    pub base_url: String,
    /// Bearer authentication token
    pub token: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ApiConfig {
    /// Create a configuration with the default request timeout.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Training records endpoint.
    pub fn trainings_url(&self) -> String {
        format!("{}/v1/trainings", self.base_url.trim_end_matches('/'))
    }

    /// Current-level endpoint.
    pub fn current_level_url(&self) -> String {
        format!(
            "{}/v1/trainings/current-level",
            self.base_url.trim_end_matches('/')
        )
    }

    /// Sign-in endpoint.
    pub fn sign_in_url(&self) -> String {
        format!("{}/v1/auth/sign-in", self.base_url.trim_end_matches('/'))
    }
}

/// Level-update payload.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Serialize)]
struct LevelUpdate<'a> {
    kind: &'a str,
    level: u32,
}

/// Sign-in payload.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Serialize)]
struct SignIn<'a> {
    device_id: &'a str,
}

/// Async HTTP client for the therapy backend.
#[cfg(feature = "http")]
pub struct ApiClient {
    config: ApiConfig,
    client: reqwest::Client,
    device_id: String,
}

#[cfg(feature = "http")]
impl ApiClient {
    /// Create a new client.
    pub fn new(config: ApiConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            device_id: device_id(),
        })
    }

    /// Get the device ID.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Store a training record.
    pub async fn record_training(&self, record: &TrainingRecord) -> Result<(), BackendError> {
        self.post_json(self.config.trainings_url(), record).await
    }

    /// Move the player's current level for a training kind.
    pub async fn update_current_level(&self, kind: &str, level: u32) -> Result<(), BackendError> {
        self.post_json(self.config.current_level_url(), &LevelUpdate { kind, level })
            .await
    }

    /// Refresh the player's sign-in.
    pub async fn sign_in(&self) -> Result<(), BackendError> {
        let payload = SignIn {
            device_id: &self.device_id,
        };
        self.post_json(self.config.sign_in_url(), &payload).await
    }

    async fn post_json<T: Serialize>(&self, url: String, body: &T) -> Result<(), BackendError> {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BackendError::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

/// Blocking HTTP client for use in synchronous contexts.
#[cfg(feature = "http")]
pub struct BlockingApiClient {
    inner: ApiClient,
    runtime: tokio::runtime::Runtime,
}

#[cfg(feature = "http")]
impl BlockingApiClient {
    /// Create a new blocking client.
    pub fn new(config: ApiConfig) -> Result<Self, BackendError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| BackendError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: ApiClient::new(config)?,
            runtime,
        })
    }

    /// Get the device ID.
    pub fn device_id(&self) -> &str {
        self.inner.device_id()
    }
}

#[cfg(feature = "http")]
impl ProgressBackend for BlockingApiClient {
    fn record_training(&self, record: &TrainingRecord) -> Result<(), BackendError> {
        self.runtime.block_on(self.inner.record_training(record))
    }

    fn update_current_level(&self, kind: &str, level: u32) -> Result<(), BackendError> {
        self.runtime
            .block_on(self.inner.update_current_level(kind, level))
    }

    fn sign_in(&self) -> Result<(), BackendError> {
        self.runtime.block_on(self.inner.sign_in())
    }
}
