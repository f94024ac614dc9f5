//! Inventra server binary.
//!
//! Wires configuration, the attachment directory, and the metadata
//! backend together, then serves the API with graceful shutdown.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inv_api::AppState;
use inv_attachments::LocalAttachmentStore;
use inv_core::{AppConfig, DatabaseConfig};
use inv_registry::{MemoryRegistry, PgRegistry, Registry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        cache = %config.storage.attachment_dir,
        "Starting Inventra"
    );

    let store = Arc::new(LocalAttachmentStore::open(&config.storage.attachment_dir).await?);

    let registry: Arc<dyn Registry> = match &config.database {
        Some(db) => {
            let registry = connect_with_retry(db).await?;
            info!("Using PostgreSQL registry");
            Arc::new(registry)
        }
        None => {
            info!("No DATABASE_URL set; using in-memory registry");
            Arc::new(MemoryRegistry::new())
        }
    };

    let state = AppState::new(registry, store);

    let app = inv_api::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .layer(DefaultBodyLimit::max(config.storage.max_upload_size)),
    );

    let addr = config.server_addr();
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Bounded startup retry loop against the metadata store. The process
/// does not accept requests until the store is reachable and migrated.
async fn connect_with_retry(db: &DatabaseConfig) -> anyhow::Result<PgRegistry> {
    let mut attempt = 1;
    loop {
        let result = PgPoolOptions::new()
            .max_connections(db.pool_size)
            .acquire_timeout(db.acquire_timeout())
            .connect(&db.url)
            .await;

        match result {
            Ok(pool) => {
                let registry = PgRegistry::new(pool);
                registry
                    .ensure_schema()
                    .await
                    .map_err(|e| anyhow::anyhow!("schema setup failed: {e}"))?;
                info!(attempt, "Connected to metadata store");
                return Ok(registry);
            }
            Err(e) if attempt < db.connect_attempts => {
                warn!(
                    attempt,
                    max = db.connect_attempts,
                    error = %e,
                    "Metadata store not ready, retrying"
                );
                tokio::time::sleep(db.connect_backoff()).await;
                attempt += 1;
            }
            Err(e) => {
                anyhow::bail!(
                    "metadata store unreachable after {} attempts: {e}",
                    db.connect_attempts
                );
            }
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,inv_server=debug,inv_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
