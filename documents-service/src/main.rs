//! documents-service entry point.

use documents_service::http;
use documents_service::services::{metrics, Database};
use service_core::config::Config;
use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::load()?;
    init_tracing("documents-service", &config.log_level);
    metrics::init_metrics();

    let db = Database::new(&config.database_url, config.max_connections).await?;
    db.run_migrations().await?;

    let app = http::router(db);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "documents-service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
