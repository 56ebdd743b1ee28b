//! hisho backend
//!
//! Main application entry point

use std::sync::Arc;

use tracing::info;

use hisho::api::{build_router, AppState};
use hisho::config::Settings;
use hisho::database::{connection, DatabaseService};
use hisho::services::ServiceFactory;
use hisho::utils::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    logging::init_logging(&settings.logging)?;

    info!("Starting hisho backend...");

    // Initialize database connection
    info!("Connecting to database...");
    let db_config = connection::DatabaseConfig {
        url: settings.database.url.clone(),
        max_connections: settings.database.max_connections,
        min_connections: settings.database.min_connections,
        ..Default::default()
    };
    let pool = connection::create_pool(&db_config).await?;

    // Run database migrations
    connection::run_migrations(&pool).await?;

    // Initialize services
    info!("Initializing services...");
    let db = DatabaseService::new(pool);
    let services = ServiceFactory::new(&settings, db)?;

    let state = AppState {
        services: Arc::new(services),
        timezone_offset_hours: settings.reminder.timezone_offset_hours,
    };
    let router = build_router(state);

    let addr = format!("{}:{}", settings.api.bind_address, settings.api.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("hisho backend has been shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install shutdown handler");
    }
}
