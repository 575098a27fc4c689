//! Service binary: configuration, database bootstrap, HTTP server.

use export_stream::{AppState, Config, Database, InMemoryJobRegistry, Result, start_api_server};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(Config::from_env()?);
    tracing::info!(
        address = %config.bind_address(),
        database_url = %config.database_url,
        "Starting export-stream"
    );

    let database = Arc::new(Database::new(&config).await?);
    database.health_check().await?;

    // Give local runs something to export
    if database.count_records().await? == 0 && config.seed_row_count > 0 {
        database.seed_records(config.seed_row_count).await?;
    }

    let registry = Arc::new(InMemoryJobRegistry::new());
    let state = AppState::new(registry, database, config);

    start_api_server(state).await
}
