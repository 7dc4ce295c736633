use axum::{Router, middleware, routing::get};
use domain_connections::{
    ApplicantTracker, ConnectionRepository, ConnectionService, Notifier,
    handlers as connection_handlers,
};
use domain_matching::{InMemoryProfileRepository, MatchService, handlers as match_handlers};
use observability::metrics_middleware;
use std::sync::Arc;

pub mod health;

/// API routes without the `/api` prefix; `create_router` adds it.
///
/// `/matches` carries both the match feeds and the applicant list for a job,
/// since both are read through the matching engine.
pub fn routes<C>(
    matching: Arc<MatchService<InMemoryProfileRepository>>,
    connections: Arc<C>,
    notifier: Notifier,
) -> Router
where
    C: ConnectionRepository + 'static,
{
    let service = ConnectionService::from_shared(connections.clone()).with_notifier(notifier);
    let tracker = ApplicantTracker::new(matching.clone(), connections);

    Router::new()
        .nest(
            "/matches",
            match_handlers::router(matching)
                .merge(connection_handlers::applicants_router(Arc::new(tracker))),
        )
        .nest("/connections", connection_handlers::router(Arc::new(service)))
        .layer(middleware::from_fn(metrics_middleware))
}

/// `/ready` with the app state applied, merged next to the stateless routes.
pub fn ready_router(state: crate::state::AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use domain_connections::{InMemoryConnectionRepository, TracingSink};
    use domain_matching::{MatchingConfig, ProfileFixtures};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const FIXTURES: &str = include_str!("../../fixtures/profiles.json");
    const FOUNDER: &str = "0190a1b2-0000-7000-8000-000000000001";
    const TALENT: &str = "0190a1b2-0000-7000-8000-000000000011";

    async fn app() -> Router {
        let profiles = InMemoryProfileRepository::new();
        profiles
            .seed(ProfileFixtures::from_json(FIXTURES).unwrap())
            .await
            .unwrap();
        let matching = Arc::new(MatchService::new(profiles, MatchingConfig::default()));
        let (notifier, _worker) = Notifier::spawn(Arc::new(TracingSink), 16);
        routes(matching, Arc::new(InMemoryConnectionRepository::new()), notifier)
    }

    fn request(method: &str, uri: &str, user_id: &str, role: &str, body: Option<&str>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-user-id", user_id)
            .header("x-user-role", role)
            .header("content-type", "application/json");
        builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_default())
            .unwrap()
    }

    #[tokio::test]
    async fn test_match_then_connect() {
        let app = app().await;

        let response = app
            .clone()
            .oneshot(request("GET", "/matches/talent", FOUNDER, "founder", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let matches: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let target = matches["items"][0]["target_owner_id"].as_str().unwrap().to_string();

        let body = format!(r#"{{"target_id":"{target}","message":"Let's talk"}}"#);
        let response = app
            .clone()
            .oneshot(request("POST", "/connections/request", FOUNDER, "founder", Some(&body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(request("POST", "/connections/request", FOUNDER, "founder", Some(&body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_applicants_mounted_under_matches() {
        let job = "0190a1b2-0000-7000-8000-0000000000b1";
        let response = app()
            .await
            .oneshot(request(
                "GET",
                &format!("/matches/jobs/{job}/applicants"),
                TALENT,
                "talent",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_ready_without_database() {
        temp_env::async_with_vars([("DATABASE_URL", None::<&str>)], async {
            let state = crate::state::AppState {
                config: crate::config::Config::from_env().unwrap(),
                db: None,
            };
            let response = ready_router(state)
                .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        })
        .await;
    }
}
