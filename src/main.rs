use std::env;
use std::sync::Arc;

use salarium::api::{AppState, create_router};
use salarium::config::ConfigLoader;
use salarium::store::{MemoryStore, PayrollStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "config/salarium.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = env::var("SALARIUM_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = ConfigLoader::load(&config_path)?;

    let store: Arc<dyn PayrollStore> = match &config.config().storage.data_file {
        Some(path) => Arc::new(MemoryStore::open(path)?),
        None => {
            info!("No data file configured, salary data will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    let addr = config.config().server.bind_address();
    let app = create_router(AppState::new(config, store));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
