use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    routing::get,
};
use axum_helpers::{
    UuidPath,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::caller::Caller;
use crate::error::{MatchError, MatchResult};
use crate::models::{
    FitLabel, MatchList, MatchQuery, MatchRecord, MatchScores, MatchTarget, PairingDetails,
    UserRole,
};
use crate::repository::ProfileRepository;
use crate::service::MatchService;

pub const TAG: &str = "matches";

#[derive(OpenApi)]
#[openapi(
    paths(list_matches, job_feed, matches_for_job),
    components(
        schemas(
            MatchList, MatchRecord, MatchScores, PairingDetails, FitLabel, MatchTarget,
            UserRole, MatchQuery
        ),
        responses(
            NotFoundResponse,
            ForbiddenResponse,
            UnauthorizedResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Ranked matches between startups, talent and investors")
    )
)]
pub struct ApiDoc;

/// Routes mounted under `/matches`.
pub fn router<R: ProfileRepository + 'static>(service: Arc<MatchService<R>>) -> Router {
    Router::new()
        .route("/jobs", get(job_feed))
        .route("/jobs/{job_id}", get(matches_for_job))
        .route("/{role}", get(list_matches))
        .with_state(service)
}

fn query_params(query: Result<Query<MatchQuery>, QueryRejection>) -> MatchResult<MatchQuery> {
    query
        .map(|Query(q)| q)
        .map_err(|e| MatchError::Validation(e.body_text()))
}

/// Ranked matches for the caller's profile against another role
#[utoipa::path(
    get,
    path = "/{role}",
    tag = TAG,
    params(
        ("role" = MatchTarget, Path, description = "talent | investors | startups"),
        ("x-user-id" = Uuid, Header, description = "Authenticated user id"),
        ("x-user-role" = UserRole, Header, description = "Authenticated user role"),
        MatchQuery
    ),
    responses(
        (status = 200, description = "Ranked matches", body = MatchList),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_matches<R: ProfileRepository>(
    State(service): State<Arc<MatchService<R>>>,
    caller: Caller,
    Path(role): Path<String>,
    query: Result<Query<MatchQuery>, QueryRejection>,
) -> MatchResult<Json<MatchList>> {
    let target = role
        .parse::<MatchTarget>()
        .map_err(|_| MatchError::Validation(format!("Unknown match feed: {role}")))?;
    let records = service
        .matches_for(&caller, target, query_params(query)?)
        .await?;
    Ok(Json(records.into()))
}

/// Open jobs ranked for the calling talent
#[utoipa::path(
    get,
    path = "/jobs",
    tag = TAG,
    params(
        ("x-user-id" = Uuid, Header, description = "Authenticated user id"),
        ("x-user-role" = UserRole, Header, description = "Authenticated user role"),
        MatchQuery
    ),
    responses(
        (status = 200, description = "Ranked job matches", body = MatchList),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn job_feed<R: ProfileRepository>(
    State(service): State<Arc<MatchService<R>>>,
    caller: Caller,
    query: Result<Query<MatchQuery>, QueryRejection>,
) -> MatchResult<Json<MatchList>> {
    let records = service.job_feed(&caller, query_params(query)?).await?;
    Ok(Json(records.into()))
}

/// Talent ranked against one job's required skills (job owner only)
#[utoipa::path(
    get,
    path = "/jobs/{job_id}",
    tag = TAG,
    params(
        ("job_id" = Uuid, Path, description = "Job posting id"),
        ("x-user-id" = Uuid, Header, description = "Authenticated user id"),
        ("x-user-role" = UserRole, Header, description = "Authenticated user role"),
        MatchQuery
    ),
    responses(
        (status = 200, description = "Ranked candidates for the job", body = MatchList),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn matches_for_job<R: ProfileRepository>(
    State(service): State<Arc<MatchService<R>>>,
    caller: Caller,
    UuidPath(job_id): UuidPath,
    query: Result<Query<MatchQuery>, QueryRejection>,
) -> MatchResult<Json<MatchList>> {
    let records = service
        .matches_for_job(&caller, job_id, query_params(query)?)
        .await?;
    Ok(Json(records.into()))
}
