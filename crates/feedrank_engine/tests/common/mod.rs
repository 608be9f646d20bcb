#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use feedrank_engine::{
    BrowserError, BrowserLauncher, EngineEvent, FeedBrowser, FeedNode, ProgressSink,
};
use tokio::sync::Notify;
use url::Url;

pub const PAGE_URL: &str = "https://x.com/alice";

/// Outer HTML of one post carrying all its counts in a single group label.
pub fn post(id: u64, text: &str, counts: [u64; 5]) -> String {
    let [replies, reposts, likes, bookmarks, views] = counts;
    format!(
        r#"<article role="article" data-testid="tweet">
  <div data-testid="User-Name">
    <span>Alice</span><span>@alice</span>
    <div><a href="/alice/status/{id}"><time datetime="2024-03-01T10:00:00.000Z">Mar 1</time></a></div>
  </div>
  <div data-testid="tweetText" lang="en">{text}</div>
  <div role="group" aria-label="{replies} replies, {reposts} reposts, {likes} likes, {bookmarks} bookmarks, {views} views"></div>
</article>"#
    )
}

#[derive(Debug, Default)]
pub struct BrowserLog {
    pub navigations: Vec<String>,
    pub scrolls: usize,
    pub closed: usize,
}

/// Browser replaying a fixed feed. `passes[i]` is what is rendered after `i`
/// scrolls; the last pass repeats once the script runs out.
#[derive(Clone, Default)]
pub struct ScriptedBrowser {
    pub layout_ready: bool,
    pub content_ready: bool,
    pub source: String,
    pub passes: Vec<Vec<String>>,
    pub fail_on_scroll: Option<usize>,
    pub panic_on_find: bool,
    pub log: Arc<Mutex<BrowserLog>>,
}

impl ScriptedBrowser {
    pub fn feed(passes: Vec<Vec<String>>) -> Self {
        Self {
            layout_ready: true,
            content_ready: true,
            passes,
            ..Self::default()
        }
    }

    pub fn scrolls(&self) -> usize {
        self.log.lock().unwrap().scrolls
    }

    pub fn navigations(&self) -> usize {
        self.log.lock().unwrap().navigations.len()
    }

    pub fn closed(&self) -> usize {
        self.log.lock().unwrap().closed
    }

    fn current_pass(&self) -> Vec<String> {
        let scrolls = self.scrolls();
        match self.passes.len() {
            0 => Vec::new(),
            len => self.passes[scrolls.min(len - 1)].clone(),
        }
    }
}

#[async_trait::async_trait]
impl FeedBrowser for ScriptedBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.log.lock().unwrap().navigations.push(url.to_string());
        Ok(())
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, BrowserError> {
        if selector.contains("primaryColumn") {
            Ok(self.layout_ready)
        } else {
            Ok(self.content_ready)
        }
    }

    async fn find_nodes(&mut self, selector: &str) -> Result<Vec<FeedNode>, BrowserError> {
        if self.panic_on_find {
            panic!("renderer crashed");
        }
        // Posts match both the testid and the article selector.
        if selector.contains("cellInnerDiv") {
            return Ok(Vec::new());
        }
        let page = Url::parse(PAGE_URL).ok();
        Ok(self
            .current_pass()
            .into_iter()
            .map(|html| FeedNode::new(html, page.clone()))
            .collect())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError> {
        let mut log = self.log.lock().unwrap();
        if self.fail_on_scroll == Some(log.scrolls) {
            return Err(BrowserError::Network("connection reset".to_string()));
        }
        log.scrolls += 1;
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        Ok(self.source.clone())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.log.lock().unwrap().closed += 1;
        Ok(())
    }
}

/// Hands out clones of one scripted browser; clones share the log.
pub struct ScriptedLauncher {
    pub browser: ScriptedBrowser,
    pub launch_error: Option<BrowserError>,
    pub gate: Option<Arc<Notify>>,
}

impl ScriptedLauncher {
    pub fn new(browser: ScriptedBrowser) -> Self {
        Self {
            browser,
            launch_error: None,
            gate: None,
        }
    }
}

#[async_trait::async_trait]
impl BrowserLauncher for ScriptedLauncher {
    async fn launch(&self) -> Result<Box<dyn FeedBrowser>, BrowserError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.launch_error {
            Some(err) => Err(err.clone()),
            None => Ok(Box::new(self.browser.clone())),
        }
    }
}

#[derive(Default)]
pub struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
