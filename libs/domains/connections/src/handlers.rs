use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, DuplicateRequestResponse,
        ForbiddenResponse, InternalServerErrorResponse, InvalidTransitionResponse,
        NotFoundResponse, UnauthorizedResponse,
    },
};
use domain_matching::{Caller, ProfileRepository};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::applicants::ApplicantTracker;
use crate::error::{ConnectionError, ConnectionResult};
use crate::models::{
    Applicant, ApplicantList, ConnectionList, ConnectionListQuery, ConnectionRequest,
    ConnectionStatus, CreateConnectionRequest, Decision, Direction, RespondToConnection,
};
use crate::repository::ConnectionRepository;
use crate::service::ConnectionService;

pub const TAG: &str = "connections";
pub const APPLICANTS_TAG: &str = "applicants";

#[derive(OpenApi)]
#[openapi(
    paths(
        request_connection,
        list_connections,
        get_connection,
        respond_to_connection,
        withdraw_connection,
    ),
    components(
        schemas(
            ConnectionRequest, ConnectionStatus, CreateConnectionRequest, Decision,
            RespondToConnection, Direction, ConnectionList
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            DuplicateRequestResponse,
            InvalidTransitionResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Connection requests between matched users")
    )
)]
pub struct ApiDoc;

/// Applicant tracking, documented next to the `/matches` feeds it is mounted with.
#[derive(OpenApi)]
#[openapi(
    paths(list_applicants),
    components(
        schemas(Applicant, ApplicantList, ConnectionRequest, ConnectionStatus),
        responses(
            BadRequestUuidResponse,
            ForbiddenResponse,
            NotFoundResponse,
            InternalServerErrorResponse
        )
    ),
    tags((name = APPLICANTS_TAG, description = "Applicant tracking for job postings"))
)]
pub struct ApplicantsApiDoc;

/// Routes mounted under `/connections`.
pub fn router<R: ConnectionRepository + 'static>(service: Arc<ConnectionService<R>>) -> Router {
    Router::new()
        .route("/", get(list_connections))
        .route("/request", post(request_connection))
        .route("/{id}", get(get_connection))
        .route("/{id}/respond", post(respond_to_connection))
        .route("/{id}/withdraw", post(withdraw_connection))
        .with_state(service)
}

/// Routes mounted under `/matches`, next to the matching feeds.
pub fn applicants_router<P, C>(tracker: Arc<ApplicantTracker<P, C>>) -> Router
where
    P: ProfileRepository + 'static,
    C: ConnectionRepository + 'static,
{
    Router::new()
        .route("/jobs/{job_id}/applicants", get(list_applicants))
        .with_state(tracker)
}

fn audit_outcome(err: &ConnectionError) -> AuditOutcome {
    match err {
        ConnectionError::Unauthorized(_) => AuditOutcome::Denied,
        _ => AuditOutcome::Failure,
    }
}

/// Send a connection request
#[utoipa::path(
    post,
    path = "/request",
    tag = TAG,
    request_body = CreateConnectionRequest,
    params(
        ("x-user-id" = Uuid, Header, description = "Authenticated user id"),
        ("x-user-role" = String, Header, description = "Authenticated user role")
    ),
    responses(
        (status = 201, description = "Connection request created", body = ConnectionRequest),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 409, response = DuplicateRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn request_connection<R: ConnectionRepository>(
    State(service): State<Arc<ConnectionService<R>>>,
    caller: Caller,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateConnectionRequest>,
) -> ConnectionResult<impl IntoResponse> {
    let target_id = input.target_id;
    let job_id = input.job_id;

    match service.request_connection(&caller, input).await {
        Ok(request) => {
            AuditEvent::new(Some(caller.user_id), "connection.request", AuditOutcome::Success)
                .with_resource("connection", request.id)
                .with_request_headers(&headers)
                .with_details(json!({ "target_id": target_id, "job_id": job_id }))
                .log();
            Ok((StatusCode::CREATED, Json(request)))
        }
        Err(e) => {
            AuditEvent::new(Some(caller.user_id), "connection.request", audit_outcome(&e))
                .with_request_headers(&headers)
                .with_details(json!({ "target_id": target_id, "job_id": job_id, "error": e.to_string() }))
                .log();
            Err(e)
        }
    }
}

/// List the caller's sent and received connection requests
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(
        ("x-user-id" = Uuid, Header, description = "Authenticated user id"),
        ("x-user-role" = String, Header, description = "Authenticated user role"),
        ConnectionListQuery
    ),
    responses(
        (status = 200, description = "Connection requests, newest first", body = ConnectionList),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_connections<R: ConnectionRepository>(
    State(service): State<Arc<ConnectionService<R>>>,
    caller: Caller,
    query: Result<Query<ConnectionListQuery>, QueryRejection>,
) -> ConnectionResult<Json<ConnectionList>> {
    let Query(query) = query.map_err(|e| ConnectionError::Validation(e.body_text()))?;
    let list = service.list_for(&caller, query.direction).await?;
    Ok(Json(list))
}

/// Get a connection request by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Connection request ID"),
        ("x-user-id" = Uuid, Header, description = "Authenticated user id"),
        ("x-user-role" = String, Header, description = "Authenticated user role")
    ),
    responses(
        (status = 200, description = "Connection request found", body = ConnectionRequest),
        (status = 400, response = BadRequestUuidResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_connection<R: ConnectionRepository>(
    State(service): State<Arc<ConnectionService<R>>>,
    caller: Caller,
    UuidPath(id): UuidPath,
) -> ConnectionResult<Json<ConnectionRequest>> {
    let request = service.get(&caller, id).await?;
    Ok(Json(request))
}

/// Accept or decline a received connection request
#[utoipa::path(
    post,
    path = "/{id}/respond",
    tag = TAG,
    request_body = RespondToConnection,
    params(
        ("id" = Uuid, Path, description = "Connection request ID"),
        ("x-user-id" = Uuid, Header, description = "Authenticated user id"),
        ("x-user-role" = String, Header, description = "Authenticated user role")
    ),
    responses(
        (status = 200, description = "Request answered", body = ConnectionRequest),
        (status = 400, response = BadRequestUuidResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = InvalidTransitionResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn respond_to_connection<R: ConnectionRepository>(
    State(service): State<Arc<ConnectionService<R>>>,
    caller: Caller,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(body): ValidatedJson<RespondToConnection>,
) -> ConnectionResult<Json<ConnectionRequest>> {
    let result = service.respond(&caller, id, body.decision).await;

    let outcome = match &result {
        Ok(_) => AuditOutcome::Success,
        Err(e) => audit_outcome(e),
    };
    AuditEvent::new(Some(caller.user_id), "connection.respond", outcome)
        .with_resource("connection", id)
        .with_request_headers(&headers)
        .with_details(json!({ "decision": body.decision }))
        .log();

    Ok(Json(result?))
}

/// Withdraw a pending connection request
#[utoipa::path(
    post,
    path = "/{id}/withdraw",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Connection request ID"),
        ("x-user-id" = Uuid, Header, description = "Authenticated user id"),
        ("x-user-role" = String, Header, description = "Authenticated user role")
    ),
    responses(
        (status = 200, description = "Request withdrawn", body = ConnectionRequest),
        (status = 400, response = BadRequestUuidResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = InvalidTransitionResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn withdraw_connection<R: ConnectionRepository>(
    State(service): State<Arc<ConnectionService<R>>>,
    caller: Caller,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> ConnectionResult<Json<ConnectionRequest>> {
    let result = service.withdraw(&caller, id).await;

    let outcome = match &result {
        Ok(_) => AuditOutcome::Success,
        Err(e) => audit_outcome(e),
    };
    AuditEvent::new(Some(caller.user_id), "connection.withdraw", outcome)
        .with_resource("connection", id)
        .with_request_headers(&headers)
        .log();

    Ok(Json(result?))
}

/// Applicants for a job, ranked by their match against it (job owner only)
#[utoipa::path(
    get,
    path = "/jobs/{job_id}/applicants",
    tag = APPLICANTS_TAG,
    params(
        ("job_id" = Uuid, Path, description = "Job posting id"),
        ("x-user-id" = Uuid, Header, description = "Authenticated user id"),
        ("x-user-role" = String, Header, description = "Authenticated user role")
    ),
    responses(
        (status = 200, description = "Applicants, best match first", body = ApplicantList),
        (status = 400, response = BadRequestUuidResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_applicants<P: ProfileRepository, C: ConnectionRepository>(
    State(tracker): State<Arc<ApplicantTracker<P, C>>>,
    caller: Caller,
    UuidPath(job_id): UuidPath,
) -> ConnectionResult<Json<ApplicantList>> {
    let list = tracker.applicants_for_job(&caller, job_id).await?;
    Ok(Json(list))
}
