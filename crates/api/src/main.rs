use anyhow::{Context, Result};
use api::catalog::FsCatalog;
use api::config::{AppConfig, LogFormat};
use api::{router, GraphService};
use ingest::FsRecordSource;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config);

    let data_dir = config.server.data_dir.clone();
    tracing::info!(data_dir = %data_dir.display(), "Serving graphs from data dir");

    let source = Arc::new(FsRecordSource::new(&data_dir));
    let catalog = Arc::new(FsCatalog::new(&data_dir));
    let service = Arc::new(GraphService::new(source, catalog, &config));

    let app = router(service);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    tracing::info!("Server listening on http://{}", config.server.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    match config.server.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}
