use std::sync::Arc;

use storysplice_pipeline::orchestrator::Orchestrator;
use storysplice_pipeline::registry::SessionRegistry;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (users and auth sessions).
    pub pool: storysplice_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Live editor sessions of all users.
    pub sessions: Arc<SessionRegistry>,
    /// Drives editor sessions against the media services and stores.
    pub orchestrator: Arc<Orchestrator>,
}
