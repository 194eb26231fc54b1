//! # Faktur API binary
//!
//! Startup sequence: logging → config → database (pool + migrations) →
//! router → serve until SIGINT/SIGTERM → close the pool.

use tracing::info;
use tracing_subscriber::EnvFilter;

use faktur_api::config::ApiConfig;
use faktur_api::routes::build_router;
use faktur_api::AppState;
use faktur_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is a development convenience; absence is fine.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Faktur API server...");

    let config = ApiConfig::load()?;
    info!(
        port = config.http_port,
        database = %config.database_path,
        "Configuration loaded"
    );

    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    info!("Database ready");

    let addr = format!("0.0.0.0:{}", config.http_port);
    let state = AppState::new(db.clone(), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
