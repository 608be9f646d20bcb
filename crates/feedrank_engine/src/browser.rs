use thiserror::Error;

use crate::FeedNode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrowserError {
    #[error("could not start browser: {0}")]
    Launch(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("browser request timed out: {0}")]
    Timeout(String),
    #[error("devtools error: {0}")]
    Cdp(String),
    #[error("unexpected browser response: {0}")]
    UnexpectedResponse(String),
    #[error("invalid url {0}")]
    InvalidUrl(String),
    #[error("browser session already closed")]
    Closed,
}

/// Live page driven by the pagination controller.
///
/// Every call is awaited to completion before the next one is issued; the
/// controller never runs two commands against one page concurrently.
#[async_trait::async_trait]
pub trait FeedBrowser: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// True when at least one element in the document matches `selector`.
    async fn exists(&mut self, selector: &str) -> Result<bool, BrowserError>;

    /// Snapshots of every element matching `selector`, in document order.
    async fn find_nodes(&mut self, selector: &str) -> Result<Vec<FeedNode>, BrowserError>;

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError>;

    /// Serialized document, used to look for account-state markers.
    async fn page_source(&mut self) -> Result<String, BrowserError>;

    /// Releases the session. Calling it twice is not an error.
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// Opens a fresh browser session for each job.
#[async_trait::async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn FeedBrowser>, BrowserError>;
}
