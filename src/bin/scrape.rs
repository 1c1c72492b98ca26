use anyhow::{Context, Result};
use pricewatch::{app_state::price_service, config::Config};
use tracing::info;

/// Run one scrape cycle, update the cache and print the snapshot as JSON.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    let service = price_service(&config).await?;
    info!(products = service.catalog().len(), "starting scrape cycle");

    let snapshot = service.refresh().await.context("Failed to write price cache")?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
