//! Feedrank engine: browser capability, extraction and the background job.
mod browser;
mod chrome;
mod controller;
mod engine;
mod fields;
mod metrics;
mod node;
mod selectors;
mod types;

pub use browser::{BrowserError, BrowserLauncher, FeedBrowser};
pub use chrome::{ChromeLauncher, ChromeSession, ChromeSettings};
pub use controller::{classify_page, PaginationController, ProgressSink, ScrapeSettings};
pub use engine::{account_from_input, JobTracker, StartError};
pub use fields::{extract_record, resolve_permalink};
pub use metrics::{extract_metrics, MetricKind};
pub use node::{ElementSnapshot, FeedNode, NodeQuery, ParsedNode, QueryError};
pub use types::{EngineEvent, JobProgress, Phase};
