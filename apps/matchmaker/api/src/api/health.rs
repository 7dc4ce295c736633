//! Readiness probe with real dependency checks.

use crate::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};

/// Pings PostgreSQL when it is configured. In-memory mode has nothing to
/// check and always reports ready.
pub async fn ready_handler(State(state): State<AppState>) -> Response {
    let mut checks: Vec<(&str, HealthCheckFuture<'_>)> = Vec::new();

    if let Some(db) = state.db.as_ref() {
        checks.push((
            "database",
            Box::pin(async move {
                db.ping()
                    .await
                    .map_err(|e| format!("Database ping failed: {e}"))
            }),
        ));
    }

    run_health_checks(checks).await.into_response()
}
