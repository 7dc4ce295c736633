use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::models::UserRole;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Profile not found: {0}")]
    ProfileNotFound(Uuid),

    #[error("No {role} profile for user {user_id}")]
    NoProfileForUser { user_id: Uuid, role: UserRole },

    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("User {0} is not allowed to act on this resource")]
    Unauthorized(Uuid),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Unsupported pairing: {subject} -> {target}")]
    UnsupportedPairing { subject: UserRole, target: UserRole },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type MatchResult<T> = Result<T, MatchError>;

impl From<reqwest::Error> for MatchError {
    fn from(err: reqwest::Error) -> Self {
        MatchError::EmbeddingUnavailable(err.to_string())
    }
}

impl From<MatchError> for AppError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::ProfileNotFound(id) => AppError::NotFound(format!("Profile {id} not found")),
            MatchError::NoProfileForUser { .. } => AppError::NotFound(err.to_string()),
            MatchError::JobNotFound(id) => AppError::NotFound(format!("Job {id} not found")),
            MatchError::Forbidden(msg) => AppError::Forbidden(msg),
            MatchError::Unauthorized(_) => AppError::Forbidden(err.to_string()),
            MatchError::Validation(msg) => AppError::BadRequest(msg),
            MatchError::UnsupportedPairing { .. } => AppError::BadRequest(err.to_string()),
            MatchError::EmbeddingUnavailable(msg) => AppError::EmbeddingUnavailable(msg),
            MatchError::DimensionMismatch { .. } | MatchError::Internal(_) => {
                AppError::InternalServerError(err.to_string())
            }
        }
    }
}

impl IntoResponse for MatchError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (MatchError::ProfileNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (MatchError::JobNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (MatchError::Unauthorized(Uuid::nil()), StatusCode::FORBIDDEN),
            (MatchError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                MatchError::DimensionMismatch { left: 3, right: 4 },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                MatchError::EmbeddingUnavailable("timeout".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
