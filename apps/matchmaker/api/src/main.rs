use axum::routing::get;
use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_connections::{InMemoryConnectionRepository, Notifier, PgConnectionRepository};
use domain_matching::{
    InMemoryProfileRepository, MatchService, OpenAIEmbeddingProvider, ProfileFixtures,
};
use observability::{init_metrics, metrics_handler};
use std::sync::Arc;
use tracing::{info, warn};

mod api;
mod config;
mod db;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);
    init_metrics();

    let profiles = InMemoryProfileRepository::new();
    match &config.fixtures_path {
        Some(path) => {
            profiles.seed(ProfileFixtures::load(path).await?).await?;
            info!(path = %path, "Profiles loaded");
        }
        None => warn!("PROFILE_FIXTURES_PATH not set, starting with no profiles"),
    }

    let mut matching = MatchService::new(profiles, config.matching.clone());
    match config.openai.clone() {
        Some(openai) => {
            info!(model = %openai.model, dimension = openai.dimension, "Semantic scoring enabled");
            matching = matching.with_embedder(Arc::new(OpenAIEmbeddingProvider::new(openai)));
        }
        None => warn!("OPENAI_API_KEY not set, scoring on skill overlap only"),
    }
    let matching = Arc::new(matching);

    let (notifier, notifier_handle) =
        Notifier::spawn(config.notifier.sink()?, config.notifier.queue_capacity);

    let db = match &config.database {
        Some(database) => Some(db::connect_and_migrate(database).await?),
        None => {
            warn!("DATABASE_URL not set, connection requests are kept in memory");
            None
        }
    };

    let api_routes = match &db {
        Some(db) => api::routes(
            matching,
            Arc::new(PgConnectionRepository::new(db.clone())),
            notifier,
        ),
        None => api::routes(
            matching,
            Arc::new(InMemoryConnectionRepository::new()),
            notifier,
        ),
    };

    let state = AppState { config, db };

    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes).await?;

    // /health: liveness, /ready: database ping, /metrics: Prometheus scrape
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.clone()))
        .route("/metrics", get(metrics_handler));

    info!(
        shutdown_timeout = ?state.config.server.shutdown_timeout,
        "Starting matchmaker API"
    );

    let server = state.config.server.clone();
    create_production_app(app, &server, async move {
        // senders live in the router, so the worker finishes once the server is gone
        match notifier_handle.await {
            Ok(()) => info!("Pending notifications flushed"),
            Err(e) => tracing::error!(error = %e, "Notification worker failed"),
        }

        if let Some(db) = state.db {
            match db.close().await {
                Ok(()) => info!("PostgreSQL connection closed"),
                Err(e) => tracing::error!(error = %e, "Error closing PostgreSQL"),
            }
        }
    })
    .await?;

    info!("Matchmaker API shutdown complete");
    Ok(())
}
