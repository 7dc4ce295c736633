use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Matchmaker API",
        version = "0.1.0",
        description = "Ranked matches between founders, talent and investors, plus the connection requests that follow them"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/matches", api = domain_matching::handlers::ApiDoc),
        (path = "/matches", api = domain_connections::handlers::ApplicantsApiDoc),
        (path = "/connections", api = domain_connections::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;
