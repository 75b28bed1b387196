use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shared_types::{ApiError, IdError};

use crate::baton::BatonError;
use crate::library::LibraryError;

/// Errors returned synchronously to callers of the conductor's operations.
///
/// Failures during distribution never surface here; they are contained in
/// the session and only visible in logs and the status summary.
#[derive(Debug, thiserror::Error)]
pub enum ConductorError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConductorError {
    pub fn code(&self) -> &'static str {
        match self {
            ConductorError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ConductorError::NotFound(_) => "NOT_FOUND",
            ConductorError::Conflict(_) => "CONFLICT",
            ConductorError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ConductorError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ConductorError::NotFound(_) => StatusCode::NOT_FOUND,
            ConductorError::Conflict(_) => StatusCode::CONFLICT,
            ConductorError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BatonError> for ConductorError {
    fn from(err: BatonError) -> Self {
        match err {
            BatonError::AlreadyPlaying | BatonError::NotPlaying => {
                ConductorError::Conflict(err.to_string())
            }
            BatonError::InvalidScore(_) => ConductorError::InvalidArgument(err.to_string()),
        }
    }
}

impl From<LibraryError> for ConductorError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::InvalidName { .. } => ConductorError::InvalidArgument(err.to_string()),
            LibraryError::NotFound(_) => ConductorError::NotFound(err.to_string()),
            LibraryError::Io(_) => ConductorError::Internal(err.to_string()),
        }
    }
}

impl From<IdError> for ConductorError {
    fn from(err: IdError) -> Self {
        ConductorError::InvalidArgument(format!("invalid worker id: {err}"))
    }
}

impl IntoResponse for ConductorError {
    fn into_response(self) -> Response {
        let message = match &self {
            ConductorError::Internal(detail) => {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::ScoreError;

    #[test]
    fn test_baton_errors_map_to_taxonomy() {
        assert_eq!(
            ConductorError::from(BatonError::AlreadyPlaying).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ConductorError::from(BatonError::InvalidScore(ScoreError::Malformed("x".into())))
                .code(),
            "INVALID_ARGUMENT"
        );
    }

    #[test]
    fn test_library_errors_map_to_taxonomy() {
        let not_found = ConductorError::from(LibraryError::NotFound("a.mid".into()));
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let traversal = ConductorError::from(LibraryError::InvalidName {
            name: "../a".into(),
            reason: "path escapes the score directory",
        });
        assert_eq!(traversal.status_code(), StatusCode::BAD_REQUEST);
    }
}
