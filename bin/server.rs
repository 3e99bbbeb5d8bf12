// SWIFT Registry - Web Server
// Serves the bank lookup API over an existing database

use anyhow::{Context, Result};
use std::path::Path;
use swift_registry::api::{build_router, AppState};
use swift_registry::{load_env_file, open_database, Config};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    load_env_file(Path::new(".")).context("Failed to load env file")?;
    let config = Config::from_env().context("Failed to read configuration")?;
    info!(environment = %config.environment, "Read configuration");

    let conn = open_database(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    info!(path = %config.db_path.display(), "Connected to database");

    let app = build_router(AppState::new(conn));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server failed")?;

    Ok(())
}
