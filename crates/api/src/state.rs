use std::sync::Arc;

use falgate_pipeline::LifecycleManager;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: falgate_db::DbPool,
    /// Server configuration (JWT settings, client log path).
    pub config: Arc<ServerConfig>,
    /// Submission and polling of generation requests.
    pub lifecycle: Arc<LifecycleManager>,
}
