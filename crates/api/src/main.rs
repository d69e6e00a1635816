use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storysplice_api::app::build_router;
use storysplice_api::config::ServerConfig;
use storysplice_api::state::AppState;
use storysplice_media::api::MediaApi;
use storysplice_pipeline::orchestrator::{Collaborators, Orchestrator};
use storysplice_pipeline::registry::{run_reaper, SessionRegistry};
use storysplice_pipeline::store::PgProjectStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storysplice_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = storysplice_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    storysplice_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    storysplice_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // --- Collaborators ---
    let media = Arc::new(MediaApi::from_config(&config.media).expect("Failed to build media client"));
    tracing::info!(base_url = %media.base_url(), "Media service client ready");

    let blobs = storysplice_cloud::build_blob_store(&config.storage)
        .await
        .expect("Failed to initialise blob storage");

    let orchestrator = Arc::new(Orchestrator::new(Collaborators {
        extractor: media.clone(),
        interpolator: media.clone(),
        renderer: media,
        blobs,
        projects: Arc::new(PgProjectStore::new(pool.clone())),
    }));

    // --- Editor sessions ---
    let sessions = Arc::new(SessionRegistry::new(Duration::from_secs(
        config.session_ttl_secs,
    )));
    let reaper_cancel = CancellationToken::new();
    let reaper_interval = (sessions.idle_ttl() / 4).max(Duration::from_secs(1));
    let reaper_handle = tokio::spawn(run_reaper(
        Arc::clone(&sessions),
        reaper_interval,
        reaper_cancel.clone(),
    ));
    tracing::info!(
        ttl_secs = config.session_ttl_secs,
        interval_secs = reaper_interval.as_secs(),
        "Editor session reaper started",
    );

    // --- App state ---
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );

    let state = AppState {
        pool,
        config: Arc::new(config),
        sessions,
        orchestrator,
    };
    let app = build_router(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    reaper_cancel.cancel();
    if tokio::time::timeout(shutdown_timeout, reaper_handle).await.is_err() {
        tracing::warn!("Editor session reaper did not stop in time");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
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
