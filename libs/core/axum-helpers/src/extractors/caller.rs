//! Caller identity taken from gateway-supplied headers.
//!
//! Authentication happens upstream; the gateway forwards the authenticated user id
//! and role. This extractor only checks that both are present and well formed.

use crate::errors::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Raw caller identity. Domain crates refine `role` into their own enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub user_id: Uuid,
    pub role: String,
}

impl CallerContext {
    pub fn from_parts(parts: &Parts) -> Result<Self, AppError> {
        let user_id = header_value(parts, USER_ID_HEADER)?;
        let user_id = Uuid::parse_str(user_id)
            .map_err(|_| AppError::Unauthorized(format!("Invalid {USER_ID_HEADER} header")))?;

        let role = header_value(parts, USER_ROLE_HEADER)?.to_ascii_lowercase();

        Ok(Self { user_id, role })
    }
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Unauthorized(format!("Missing {name} header")))
}

impl<S> FromRequestParts<S> for CallerContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts)
    }
}
