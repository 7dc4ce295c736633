use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use domain_matching::MatchError;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::models::ConnectionStatus;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Connection request not found: {0}")]
    NotFound(Uuid),

    #[error("An active connection request already exists: {existing_id}")]
    DuplicateRequest { existing_id: Uuid },

    #[error("Cannot move request {id} from {from} to {to}")]
    InvalidTransition {
        id: Uuid,
        from: ConnectionStatus,
        to: ConnectionStatus,
    },

    #[error("User {0} is not allowed to act on this connection request")]
    Unauthorized(Uuid),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ConnectionResult<T> = Result<T, ConnectionError>;

impl From<DbErr> for ConnectionError {
    fn from(err: DbErr) -> Self {
        ConnectionError::Storage(err.to_string())
    }
}

impl From<ConnectionError> for AppError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::NotFound(id) => {
                AppError::NotFound(format!("Connection request {id} not found"))
            }
            ConnectionError::DuplicateRequest { existing_id } => AppError::DuplicateRequest {
                message: err.to_string(),
                existing_id,
            },
            ConnectionError::InvalidTransition { .. } => AppError::InvalidTransition(err.to_string()),
            ConnectionError::Unauthorized(_) => AppError::Forbidden(err.to_string()),
            ConnectionError::Validation(msg) => AppError::BadRequest(msg),
            ConnectionError::Match(e) => e.into(),
            ConnectionError::Storage(msg) => AppError::Storage(msg),
            ConnectionError::Delivery(msg) | ConnectionError::Internal(msg) => {
                AppError::InternalServerError(msg)
            }
        }
    }
}

impl IntoResponse for ConnectionError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
