//! HTTP API for the conductor
//!
//! Registry and playback control under `/v1`, plus the unversioned
//! `/health`, `/ready` and `/info` probes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use shared_types::{InfoResponse, PlayResponse, RegisterWorkerRequest, SessionStatus, Worker};

use crate::error::ConductorError;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, ConductorError>;

/// Configure all API routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/info", get(info))
        // Registry
        .route("/v1/musician", post(register_worker))
        .route("/v1/musician/{id}", delete(unregister_worker))
        .route("/v1/musicians", get(list_workers))
        // Playback
        .route("/v1/music/play/{*name}", post(play))
        .route("/v1/music/pause", post(pause))
        .route("/v1/music/resume", post(resume))
        .route("/v1/music/stop", post(stop))
        .route("/v1/music/status", get(status))
}

#[derive(Debug, Serialize)]
pub struct Empty {}


async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn ready_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.status.healthy() {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable" })),
        )
    }
}

async fn info() -> Json<InfoResponse> {
    Json(InfoResponse::for_crate(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
    ))
}

/// POST /v1/musician
async fn register_worker(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterWorkerRequest>,
) -> ApiResult<Empty> {
    state.registry.register_worker(&req.id, &req.address).await?;
    Ok(Json(Empty {}))
}

/// DELETE /v1/musician/{id}
async fn unregister_worker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Empty> {
    state.registry.unregister_worker(&id).await?;
    Ok(Json(Empty {}))
}

/// GET /v1/musicians, in registration order
async fn list_workers(State(state): State<Arc<AppState>>) -> Json<Vec<Worker>> {
    Json(state.registry.workers().await)
}

/// POST /v1/music/play/{name}
async fn play(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<PlayResponse> {
    let session_id = state.playback.play_score(&name).await?;
    Ok(Json(PlayResponse { session_id }))
}

async fn pause(State(state): State<Arc<AppState>>) -> ApiResult<Empty> {
    state.playback.pause()?;
    Ok(Json(Empty {}))
}

async fn resume(State(state): State<Arc<AppState>>) -> ApiResult<Empty> {
    state.playback.resume()?;
    Ok(Json(Empty {}))
}

async fn stop(State(state): State<Arc<AppState>>) -> ApiResult<Empty> {
    state.playback.stop()?;
    Ok(Json(Empty {}))
}

async fn status(State(state): State<Arc<AppState>>) -> Json<SessionStatus> {
    Json(state.status.status().await)
}
