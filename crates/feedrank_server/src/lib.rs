//! HTTP front end for feedrank: start a scrape, poll its progress.
mod config;
mod routes;

pub use config::AppConfig;
pub use routes::{progress, router, start_scrape, AppState, ScrapeRequest};
