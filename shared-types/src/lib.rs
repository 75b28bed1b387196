//! Shared types between the conductor, musicians and the CLI
//!
//! Everything here crosses a process boundary as JSON over HTTP.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod id;

pub use id::{IdError, WorkerId, ID_SIZE};

/// Protocol versions served by every daemon.
pub const API_VERSIONS: &[&str] = &["v1"];

// ============================================================================
// Registry
// ============================================================================

/// A worker as the conductor knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    /// Opaque endpoint locator (scheme + host + port), e.g. `http://10.0.0.4:8090`
    pub address: String,
}

/// Body of `POST /v1/musician`.
///
/// The id is carried as a raw string so malformed ids surface as
/// `INVALID_ARGUMENT` from the handler rather than as a body rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterWorkerRequest {
    pub id: String,
    pub address: String,
}

// ============================================================================
// Delivery
// ============================================================================

/// Body of the musician's `POST /v1/play`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayNoteRequest {
    /// Event payload, base64 (standard alphabet, no padding)
    pub note: String,
}

// ============================================================================
// Playback status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    Playing,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Playing => write!(f, "playing"),
        }
    }
}

/// Counters for one finished session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Tracks found in the score
    pub tracks: usize,
    /// Tracks that had a worker at session start
    pub routed_tracks: usize,
    /// Track indices that had no worker and were skipped
    pub dropped_tracks: Vec<usize>,
    pub delivered: u64,
    pub failed: u64,
    /// Events discarded without a delivery attempt (worker gone, cancelled)
    pub skipped: u64,
    pub cancelled: bool,
}

/// Response of `POST /v1/music/play/{name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayResponse {
    pub session_id: String,
}

/// Response of `GET /v1/music/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub state: PlaybackState,
    pub paused: bool,
    pub workers: usize,
    pub sessions_completed: u64,
    pub last_session: Option<SessionSummary>,
}

// ============================================================================
// Common responses
// ============================================================================

/// Machine-readable error body: `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildInfo {
    pub name: String,
    pub version: String,
}

/// Response of `GET /info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
    pub versions: Vec<String>,
    pub build: BuildInfo,
}

impl InfoResponse {
    pub fn for_crate(name: &str, version: &str) -> Self {
        Self {
            versions: API_VERSIONS.iter().map(|v| v.to_string()).collect(),
            build: BuildInfo {
                name: name.to_string(),
                version: version.to_string(),
            },
        }
    }
}

/// Generate a new session id (ULID).
pub fn new_session_id() -> String {
    ulid::Ulid::new().to_string()
}
