use std::sync::Arc;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sanctuary::{
    api,
    auth::TokenVerifier,
    config::Settings,
    service::ServiceContext,
    storage::LocalBlobStore,
};

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sanctuary=debug,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Settings decide the log format, so failures are reported once tracing is up.
    let loaded = Settings::new();
    let json_logs = loaded.as_ref().map(|s| s.logging.json).unwrap_or(false);
    init_tracing(json_logs);

    let settings = loaded.unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting Sanctuary server on {}", settings.bind_address());

    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    tokio::fs::create_dir_all(&settings.server.uploads_dir).await?;
    let blob_store = Arc::new(LocalBlobStore::new(&settings.server.uploads_dir));

    let service_context = Arc::new(ServiceContext::new(db_pool.clone(), blob_store));
    let verifier = Arc::new(TokenVerifier::new(
        &settings.auth.jwt_secret,
        settings.auth.admin_roles.clone(),
    ));

    let listener = tokio::net::TcpListener::bind(settings.bind_address()).await?;
    tracing::info!("Server listening on http://{}", settings.bind_address());

    let app = api::create_app(service_context, Arc::new(settings), verifier);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    tracing::info!("Server stopped");

    Ok(())
}
