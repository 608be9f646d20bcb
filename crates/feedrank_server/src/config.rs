use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use feedrank_engine::{ChromeSettings, ScrapeSettings};
use feedrank_logging::LogDestination;

const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Process configuration: engine defaults overlaid with `FEEDRANK_*`
/// environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub log_destination: LogDestination,
    pub scrape: ScrapeSettings,
    pub chrome: ChromeSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let bind_raw = value("FEEDRANK_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_raw
            .parse()
            .with_context(|| format!("FEEDRANK_BIND is not a socket address: {bind_raw}"))?;

        let log_destination = value("FEEDRANK_LOG")
            .map(|name| LogDestination::from_name(&name))
            .unwrap_or(LogDestination::Terminal);

        let mut scrape = ScrapeSettings::default();
        if let Some(base) = value("FEEDRANK_PROFILE_BASE_URL") {
            scrape.profile_base_url = base;
        }
        if let Some(limit) = value("FEEDRANK_LIMIT") {
            scrape.limit = limit
                .parse::<usize>()
                .with_context(|| format!("FEEDRANK_LIMIT is not a number: {limit}"))?;
            anyhow::ensure!(scrape.limit > 0, "FEEDRANK_LIMIT must be at least 1");
        }

        let mut chrome = ChromeSettings {
            connect_url: value("FEEDRANK_CHROME_URL"),
            executable: value("FEEDRANK_CHROME_PATH").map(PathBuf::from),
            ..ChromeSettings::default()
        };
        if let Some(headless) = value("FEEDRANK_HEADLESS") {
            chrome.headless = headless
                .parse::<bool>()
                .with_context(|| format!("FEEDRANK_HEADLESS is not true/false: {headless}"))?;
        }

        Ok(Self {
            bind,
            log_destination,
            scrape,
            chrome,
        })
    }
}
