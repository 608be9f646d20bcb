use std::collections::HashSet;
use std::time::Duration;

use feedrank_core::{rank_records, FailureKind, JobOutcome, DEFAULT_LIMIT, TOP_RESULTS};
use feedrank_logging::{feed_debug, feed_error, feed_info, feed_warn};
use tokio::time::{sleep, Instant};

use crate::selectors::{
    CONTENT_CONTAINERS, CONTENT_SELECTORS, EMPTY_MARKERS, NOT_FOUND_MARKERS, PRIMARY_COLUMN,
    PROTECTED_MARKERS, SUSPENDED_MARKERS,
};
use crate::{
    extract_record, resolve_permalink, BrowserError, EngineEvent, FeedBrowser, JobProgress, Phase,
};

#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    /// Profile pages live at `{profile_base_url}/{account}`.
    pub profile_base_url: String,
    pub limit: usize,
    pub top_n: usize,
    pub max_empty_scrolls: u32,
    pub layout_timeout: Duration,
    pub layout_poll_interval: Duration,
    /// Extra navigations after the first one fails to show the layout.
    pub layout_retries: u32,
    pub layout_backoff: Duration,
    pub first_content_attempts: u32,
    pub first_content_wait: Duration,
    pub productive_scroll_wait: Duration,
    pub empty_scroll_wait: Duration,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            profile_base_url: "https://twitter.com".to_string(),
            limit: DEFAULT_LIMIT,
            top_n: TOP_RESULTS,
            max_empty_scrolls: 5,
            layout_timeout: Duration::from_secs(15),
            layout_poll_interval: Duration::from_millis(500),
            layout_retries: 1,
            layout_backoff: Duration::from_secs(5),
            first_content_attempts: 3,
            first_content_wait: Duration::from_secs(5),
            productive_scroll_wait: Duration::from_secs(2),
            empty_scroll_wait: Duration::from_secs(3),
        }
    }
}

impl ScrapeSettings {
    /// Settings with every wait set to zero, for driving scripted browsers.
    pub fn without_waits() -> Self {
        Self {
            layout_timeout: Duration::ZERO,
            layout_poll_interval: Duration::ZERO,
            layout_backoff: Duration::ZERO,
            first_content_wait: Duration::ZERO,
            productive_scroll_wait: Duration::ZERO,
            empty_scroll_wait: Duration::ZERO,
            ..Self::default()
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

enum Transition {
    Advance(Phase),
    Finish(JobOutcome),
}

/// Drives one profile feed from navigation to a ranked result set.
pub struct PaginationController {
    settings: ScrapeSettings,
}

impl PaginationController {
    pub fn new(settings: ScrapeSettings) -> Self {
        Self { settings }
    }

    /// Runs the job to a terminal state. Browser failures become a
    /// `JobOutcome::Faulted` outcome; this never returns an error.
    pub async fn run(
        &self,
        browser: &mut dyn FeedBrowser,
        account: &str,
        sink: &dyn ProgressSink,
    ) -> JobOutcome {
        match self.drive(browser, account, sink).await {
            Ok(outcome) => outcome,
            Err(err) => {
                feed_error!("Scrape of @{} aborted: {}", account, err);
                JobOutcome::Faulted(err.to_string())
            }
        }
    }

    async fn drive(
        &self,
        browser: &mut dyn FeedBrowser,
        account: &str,
        sink: &dyn ProgressSink,
    ) -> Result<JobOutcome, BrowserError> {
        let mut phase = Phase::LoadingProfile;
        loop {
            feed_debug!("@{}: {}", account, phase);
            sink.emit(EngineEvent::PhaseChanged(phase));
            let transition = match phase {
                Phase::LoadingProfile => self.load_profile(browser, account).await?,
                Phase::WaitingForFirstContent => {
                    self.wait_for_first_content(browser, account).await?
                }
                Phase::Collecting => {
                    Transition::Finish(self.collect(browser, account, sink).await?)
                }
            };
            match transition {
                Transition::Advance(next) => phase = next,
                Transition::Finish(outcome) => return Ok(outcome),
            }
        }
    }

    async fn load_profile(
        &self,
        browser: &mut dyn FeedBrowser,
        account: &str,
    ) -> Result<Transition, BrowserError> {
        let url = format!(
            "{}/{}",
            self.settings.profile_base_url.trim_end_matches('/'),
            account
        );

        let attempts = self.settings.layout_retries + 1;
        for attempt in 1..=attempts {
            if attempt > 1 {
                sleep(self.settings.layout_backoff).await;
            }
            browser.navigate(&url).await?;
            if self.poll_for(browser, PRIMARY_COLUMN).await? {
                return Ok(Transition::Advance(Phase::WaitingForFirstContent));
            }
            feed_warn!(
                "Profile layout for @{} missing (attempt {}/{})",
                account,
                attempt,
                attempts
            );
        }

        let source = browser.page_source().await?;
        let kind = classify_page(&source).unwrap_or(FailureKind::LoadTimeout);
        Ok(Transition::Finish(JobOutcome::Failed {
            kind,
            message: kind.describe(account),
        }))
    }

    async fn wait_for_first_content(
        &self,
        browser: &mut dyn FeedBrowser,
        account: &str,
    ) -> Result<Transition, BrowserError> {
        for attempt in 1..=self.settings.first_content_attempts {
            if content_present(browser).await? {
                return Ok(Transition::Advance(Phase::Collecting));
            }
            feed_debug!("No posts rendered for @{} yet (attempt {})", account, attempt);
            browser.scroll_to_bottom().await?;
            sleep(self.settings.first_content_wait).await;
        }

        let outcome = match classify_page(&browser.page_source().await?) {
            Some(kind) => JobOutcome::Failed {
                kind,
                message: kind.describe(account),
            },
            None => JobOutcome::Failed {
                kind: FailureKind::NoContent,
                message: format!("Could not find tweets for @{account} after multiple attempts."),
            },
        };
        Ok(Transition::Finish(outcome))
    }

    async fn collect(
        &self,
        browser: &mut dyn FeedBrowser,
        account: &str,
        sink: &dyn ProgressSink,
    ) -> Result<JobOutcome, BrowserError> {
        let limit = self.settings.limit;
        let mut seen: HashSet<String> = HashSet::new();
        let mut records = Vec::new();
        let mut empty_scrolls = 0;

        while records.len() < limit && empty_scrolls < self.settings.max_empty_scrolls {
            let mut nodes = Vec::new();
            for selector in CONTENT_CONTAINERS {
                nodes.extend(browser.find_nodes(selector).await?);
            }

            let mut found_new = false;
            for node in &nodes {
                let parsed = node.parse();
                let permalink = match resolve_permalink(&parsed) {
                    Ok(Some(permalink)) => permalink,
                    Ok(None) => continue,
                    Err(err) => {
                        feed_debug!("Skipping node without readable permalink: {}", err);
                        continue;
                    }
                };
                if !seen.insert(permalink) {
                    continue;
                }
                found_new = true;

                if let Some(record) = extract_record(&parsed) {
                    records.push(record);
                    sink.emit(EngineEvent::Progress(JobProgress {
                        scraped_count: records.len(),
                        limit,
                    }));
                    if records.len() >= limit {
                        break;
                    }
                }
            }

            if records.len() >= limit {
                break;
            }

            let wait = if found_new {
                empty_scrolls = 0;
                self.settings.productive_scroll_wait
            } else {
                empty_scrolls += 1;
                self.settings.empty_scroll_wait
            };
            browser.scroll_to_bottom().await?;
            sleep(wait).await;
        }

        feed_info!(
            "Collected {} posts for @{} ({} permalinks seen)",
            records.len(),
            account,
            seen.len()
        );
        Ok(JobOutcome::Collected(rank_records(records, self.settings.top_n)))
    }

    /// Polls until `selector` matches or the layout timeout passes. Always
    /// checks at least once.
    async fn poll_for(
        &self,
        browser: &mut dyn FeedBrowser,
        selector: &str,
    ) -> Result<bool, BrowserError> {
        let deadline = Instant::now() + self.settings.layout_timeout;
        loop {
            if browser.exists(selector).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(self.settings.layout_poll_interval).await;
        }
    }
}

async fn content_present(browser: &mut dyn FeedBrowser) -> Result<bool, BrowserError> {
    for selector in CONTENT_SELECTORS {
        if browser.exists(selector).await? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Detects why a profile page shows no feed, from its serialized source.
pub fn classify_page(source: &str) -> Option<FailureKind> {
    // The site renders apostrophes as U+2019 or HTML entities.
    let source = source
        .replace('\u{2019}', "'")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'");
    let has_any = |markers: &[&str]| markers.iter().any(|marker| source.contains(marker));

    if has_any(NOT_FOUND_MARKERS) {
        Some(FailureKind::AccountNotFound)
    } else if has_any(SUSPENDED_MARKERS) {
        Some(FailureKind::AccountSuspended)
    } else if has_any(PROTECTED_MARKERS) {
        Some(FailureKind::AccountProtected)
    } else if has_any(EMPTY_MARKERS) {
        Some(FailureKind::NoContent)
    } else {
        None
    }
}
