use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shared_types::ApiError;

use crate::sink::NoteError;

#[derive(Debug, thiserror::Error)]
pub enum MusicianError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl MusicianError {
    pub fn code(&self) -> &'static str {
        match self {
            MusicianError::InvalidArgument(_) => "INVALID_ARGUMENT",
            MusicianError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            MusicianError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            MusicianError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<NoteError> for MusicianError {
    fn from(err: NoteError) -> Self {
        match err {
            NoteError::Empty | NoteError::Malformed(_) => {
                MusicianError::InvalidArgument(err.to_string())
            }
            NoteError::Output(_) => MusicianError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for MusicianError {
    fn into_response(self) -> Response {
        let message = match &self {
            MusicianError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        (
            self.status_code(),
            Json(ApiError::new(self.code(), message)),
        )
            .into_response()
    }
}
