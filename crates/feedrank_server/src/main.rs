use std::sync::Arc;

use anyhow::{Context, Result};
use feedrank_engine::{ChromeLauncher, JobTracker};
use feedrank_logging::feed_info;
use feedrank_server::{router, AppConfig, AppState};
use log::LevelFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    feedrank_logging::initialize(config.log_destination.clone(), LevelFilter::Info);

    let launcher = Arc::new(ChromeLauncher::new(config.chrome.clone()));
    let tracker =
        JobTracker::new(launcher, config.scrape.clone()).context("starting the job engine")?;
    let app = router(Arc::new(AppState { tracker }));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    match &config.chrome.connect_url {
        Some(url) => feed_info!("feedrank listening on http://{} (browser at {url})", config.bind),
        None => feed_info!("feedrank listening on http://{} (local Chrome)", config.bind),
    }
    axum::serve(listener, app).await?;

    Ok(())
}
