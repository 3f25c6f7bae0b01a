//! zipserve binary: serves a directory of ZIP archives over HTTP.

use anyhow::Result;
use std::sync::Arc;

use zipserve::{Library, ServerConfig, http};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_args();
    config.validate()?;

    tracing::info!(
        "Serving archives from {} (cache capacity {}, max entry size {} bytes)",
        config.root.display(),
        config.cache_capacity,
        config.max_entry_size
    );

    let library = Library::open_dir(&config.root, config.cache_capacity, config.max_entry_size);
    http::start_server(config.bind, Arc::new(library)).await?;

    Ok(())
}
