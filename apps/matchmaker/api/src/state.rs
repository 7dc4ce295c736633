//! Application state shared by the app-level handlers.

use sea_orm::DatabaseConnection;

/// Cloned per request; the pool handle is an `Arc` internally.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// `None` when connection requests are kept in memory
    pub db: Option<DatabaseConnection>,
}
