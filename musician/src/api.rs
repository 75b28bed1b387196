//! HTTP API for the musician

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use serde_json::json;
use shared_types::{InfoResponse, PlayNoteRequest, WorkerId};
use tracing::{debug, warn};

use crate::error::MusicianError;
use crate::note::Note;
use crate::sink::NoteSink;

pub struct MusicianState {
    pub id: WorkerId,
    pub sink: Arc<dyn NoteSink>,
    /// Set once the conductor accepted our registration
    pub registered: AtomicBool,
}

impl MusicianState {
    pub fn new(id: WorkerId, sink: Arc<dyn NoteSink>) -> Self {
        Self {
            id,
            sink,
            registered: AtomicBool::new(false),
        }
    }

    pub fn set_registered(&self, registered: bool) {
        self.registered.store(registered, Ordering::Release);
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }
}

pub fn router() -> Router<Arc<MusicianState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/info", get(info))
        .route("/v1/play", post(play))
}

async fn health_check(State(state): State<Arc<MusicianState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "id": state.id,
    }))
}

async fn ready_check(State(state): State<Arc<MusicianState>>) -> impl IntoResponse {
    if state.is_registered() {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "registering" })),
        )
    }
}

async fn info() -> Json<InfoResponse> {
    Json(InfoResponse::for_crate(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
    ))
}

/// POST /v1/play
async fn play(
    State(state): State<Arc<MusicianState>>,
    Json(req): Json<PlayNoteRequest>,
) -> Result<Json<serde_json::Value>, MusicianError> {
    debug!(note = %req.note, "received musical note");
    let raw = STANDARD_NO_PAD.decode(req.note.trim_end_matches('=')).map_err(|e| {
        warn!(error = %e, "decoding note");
        MusicianError::InvalidArgument(format!("note is not valid base64: {e}"))
    })?;

    let note = Note::parse(&raw)?;
    state.sink.perform(&note)?;
    Ok(Json(json!({})))
}
