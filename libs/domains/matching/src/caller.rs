use axum::{extract::FromRequestParts, http::request::Parts};
use axum_helpers::{AppError, CallerContext};
use uuid::Uuid;

use crate::models::UserRole;

/// Authenticated caller of a match or connection operation.
///
/// Passed explicitly to every service call; the engine keeps no per-user state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Caller {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }
}

impl TryFrom<CallerContext> for Caller {
    type Error = AppError;

    fn try_from(ctx: CallerContext) -> Result<Self, Self::Error> {
        let role = ctx
            .role
            .parse::<UserRole>()
            .map_err(|_| AppError::Unauthorized(format!("Unknown role: {}", ctx.role)))?;
        Ok(Self::new(ctx.user_id, role))
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        CallerContext::from_parts(parts)?.try_into()
    }
}
