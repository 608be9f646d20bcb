use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Handler, Page};
use feedrank_logging::{feed_debug, feed_info, feed_warn};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::task::JoinHandle;
use url::Url;

use crate::{BrowserError, BrowserLauncher, FeedBrowser, FeedNode};

const EXISTS_SCRIPT: &str = "document.querySelector(SELECTOR) !== null";
const FIND_NODES_SCRIPT: &str = "({
    url: location.href,
    nodes: Array.from(document.querySelectorAll(SELECTOR)).map(el => el.outerHTML),
})";
const SCROLL_SCRIPT: &str = "(window.scrollTo(0, document.body.scrollHeight), true)";
const HIDE_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

/// chromiumoxide's usual launch flags, minus `--enable-automation`.
const QUIET_ARGS: &[&str] = &[
    "--disable-background-networking",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-client-side-phishing-detection",
    "--disable-default-apps",
    "--disable-extensions",
    "--disable-hang-monitor",
    "--disable-popup-blocking",
    "--disable-prompt-on-repost",
    "--disable-sync",
    "--metrics-recording-only",
    "--no-first-run",
    "--password-store=basic",
    "--use-mock-keychain",
];

/// How to obtain a Chrome instance and how to dress it.
///
/// The browser arguments are a fixed profile; nothing here adapts at runtime.
#[derive(Debug, Clone)]
pub struct ChromeSettings {
    /// DevTools endpoint of a browser that is already running. A local Chrome
    /// is launched when this is unset.
    pub connect_url: Option<String>,
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub request_timeout: Duration,
    pub window_size: (u32, u32),
    pub browser_args: Vec<String>,
    pub user_agent: String,
    pub hide_webdriver_flag: bool,
}

impl Default for ChromeSettings {
    fn default() -> Self {
        Self {
            connect_url: None,
            executable: None,
            headless: true,
            request_timeout: Duration::from_secs(60),
            window_size: (1920, 1080),
            browser_args: vec![
                "--disable-gpu".to_string(),
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
                "--disable-blink-features=AutomationControlled".to_string(),
            ],
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            hide_webdriver_flag: true,
        }
    }
}

/// Opens one Chrome page per job, launching or attaching to a browser.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    settings: ChromeSettings,
}

impl ChromeLauncher {
    pub fn new(settings: ChromeSettings) -> Self {
        Self { settings }
    }

    async fn start_browser(&self) -> Result<(Browser, Handler), BrowserError> {
        if let Some(url) = &self.settings.connect_url {
            feed_info!("Connecting to browser at {}", url);
            return Browser::connect(url.as_str())
                .await
                .map_err(|err| BrowserError::Launch(format!("{url}: {err}")));
        }

        let (width, height) = self.settings.window_size;
        let mut builder = BrowserConfig::builder()
            .disable_default_args()
            .args(launch_args(&self.settings))
            .window_size(width, height)
            .viewport(None)
            .request_timeout(self.settings.request_timeout);
        if let Some(executable) = &self.settings.executable {
            builder = builder.chrome_executable(executable);
        }
        if !self.settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        Browser::launch(config)
            .await
            .map_err(|err| BrowserError::Launch(err.to_string()))
    }
}

#[async_trait::async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn FeedBrowser>, BrowserError> {
        let (mut browser, mut handler) = self.start_browser().await?;
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    feed_debug!("Browser event loop stopped: {}", err);
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                if let Err(close_err) = browser.close().await {
                    feed_warn!("Closing browser after failed start: {}", close_err);
                }
                events.abort();
                return Err(map_cdp_error(err));
            }
        };
        if self.settings.hide_webdriver_flag {
            hide_webdriver_flag(&page).await;
        }
        feed_info!("Opened browser page");

        Ok(Box::new(ChromeSession {
            browser,
            page,
            events,
            owns_browser: self.settings.connect_url.is_none(),
            closed: false,
        }))
    }
}

pub struct ChromeSession {
    browser: Browser,
    page: Page,
    events: JoinHandle<()>,
    /// False when attached to someone else's browser; only our page is closed then.
    owns_browser: bool,
    closed: bool,
}

impl ChromeSession {
    fn ensure_open(&self) -> Result<(), BrowserError> {
        if self.closed {
            Err(BrowserError::Closed)
        } else {
            Ok(())
        }
    }

    async fn evaluate<T: DeserializeOwned>(&self, script: &str) -> Result<T, BrowserError> {
        self.ensure_open()?;
        self.page
            .evaluate(script)
            .await
            .map_err(map_cdp_error)?
            .into_value::<T>()
            .map_err(|err| BrowserError::UnexpectedResponse(err.to_string()))
    }
}

#[async_trait::async_trait]
impl FeedBrowser for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        Url::parse(url).map_err(|err| BrowserError::InvalidUrl(format!("{url}: {err}")))?;
        self.page.goto(url).await.map_err(map_cdp_error)?;
        Ok(())
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, BrowserError> {
        self.evaluate(&with_selector(EXISTS_SCRIPT, selector)).await
    }

    async fn find_nodes(&mut self, selector: &str) -> Result<Vec<FeedNode>, BrowserError> {
        let batch: NodeBatch = self
            .evaluate(&with_selector(FIND_NODES_SCRIPT, selector))
            .await?;
        let nodes = batch.into_nodes();
        feed_debug!("{} nodes match {}", nodes.len(), selector);
        Ok(nodes)
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError> {
        self.evaluate::<bool>(SCROLL_SCRIPT).await?;
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        self.ensure_open()?;
        self.page.content().await.map_err(map_cdp_error)
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        if self.closed {
            return Ok(());
        }
        // Marked closed up front; a failed close is not retried.
        self.closed = true;
        let result = if self.owns_browser {
            let closed = self.browser.close().await.map(drop);
            if let Err(err) = self.browser.wait().await {
                feed_debug!("Waiting for the browser process failed: {}", err);
            }
            closed
        } else {
            self.page.clone().close().await
        };
        self.events.abort();
        result.map_err(map_cdp_error)?;
        feed_info!("Closed browser session");
        Ok(())
    }
}

/// Outer HTML of the matches plus the address of the page that actually
/// loaded, which may differ from the one requested after a redirect.
#[derive(Debug, Deserialize)]
struct NodeBatch {
    url: String,
    nodes: Vec<String>,
}

impl NodeBatch {
    fn into_nodes(self) -> Vec<FeedNode> {
        let page_url = Url::parse(&self.url).ok();
        self.nodes
            .into_iter()
            .map(|html| FeedNode::new(html, page_url.clone()))
            .collect()
    }
}

/// Best effort: the page still works without the override.
async fn hide_webdriver_flag(page: &Page) {
    let params = AddScriptToEvaluateOnNewDocumentParams::new(HIDE_WEBDRIVER_SCRIPT);
    if let Err(err) = page.execute(params).await {
        feed_warn!("Could not install webdriver override: {}", err);
    }
}

fn launch_args(settings: &ChromeSettings) -> Vec<String> {
    QUIET_ARGS
        .iter()
        .map(|arg| arg.to_string())
        .chain(settings.browser_args.iter().cloned())
        .chain([format!("--user-agent={}", settings.user_agent)])
        .collect()
}

/// Substitutes `selector`, quoted as a JavaScript string, into `script`.
fn with_selector(script: &str, selector: &str) -> String {
    let literal = serde_json::Value::String(selector.to_string()).to_string();
    script.replace("SELECTOR", &literal)
}

fn map_cdp_error(err: CdpError) -> BrowserError {
    match err {
        CdpError::Timeout => BrowserError::Timeout("no reply from the browser".to_string()),
        CdpError::Ws(err) => BrowserError::Network(err.to_string()),
        other => BrowserError::Cdp(other.to_string()),
    }
}
