use std::net::SocketAddr;
use std::sync::Arc;

use falgate_api::config::ServerConfig;
use falgate_api::router::build_app_router;
use falgate_api::state::AppState;
use falgate_core::endpoint::EndpointConfig;
use falgate_fal::{FalApi, FalConfig};
use falgate_pipeline::{LifecycleManager, PgRequestStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "falgate_api=debug,falgate_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = falgate_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    falgate_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    falgate_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    if let Some(admin) = &config.admin_bootstrap {
        falgate_api::bootstrap::ensure_admin(&pool, admin)
            .await
            .expect("Failed to create bootstrap admin");
    }

    // --- Upstream provider and lifecycle manager ---
    let fal_config = FalConfig::from_env();
    let provider = FalApi::new(&fal_config).expect("Failed to build provider client");
    let endpoints = EndpointConfig::from_env();
    tracing::info!(
        text_endpoint = %endpoints.text_endpoint,
        edit_endpoint = %endpoints.edit_endpoint,
        timeout_secs = fal_config.timeout_secs,
        "Upstream provider configured"
    );

    let lifecycle = LifecycleManager::new(
        Arc::new(provider),
        Arc::new(PgRequestStore::new(pool.clone())),
        endpoints,
    );

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        lifecycle: Arc::new(lifecycle),
    };

    let app = build_app_router(state, &config);

    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Resolve when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
