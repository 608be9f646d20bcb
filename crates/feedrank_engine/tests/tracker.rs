mod common;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::{post, ScriptedBrowser, ScriptedLauncher};
use feedrank_core::{AccountId, JobState};
use feedrank_engine::{BrowserError, JobTracker, ScrapeSettings, StartError};
use pretty_assertions::assert_eq;
use tokio::sync::Notify;

fn account(name: &str) -> AccountId {
    AccountId::new(name).expect("valid handle")
}

fn tracker(launcher: ScriptedLauncher) -> JobTracker {
    feedrank_logging::initialize_for_tests();
    JobTracker::new(Arc::new(launcher), ScrapeSettings::without_waits()).expect("tracker")
}

fn wait_until_idle(tracker: &JobTracker) -> Arc<JobState> {
    let deadline = Instant::now() + Duration::from_secs(10);
    while tracker.is_running() {
        assert!(Instant::now() < deadline, "job did not finish");
        thread::sleep(Duration::from_millis(10));
    }
    tracker.read()
}

#[test]
fn ranks_by_engagement_rather_than_likes() {
    let browser = ScriptedBrowser::feed(vec![vec![
        // Most liked, least engaging overall.
        post(1, "popular", [0, 0, 100, 0, 1_000]),
        post(2, "discussed", [30, 10, 20, 0, 0]),
        post(3, "viral", [50, 0, 1, 0, 10_000]),
    ]]);
    let handle = browser.clone();
    let tracker = tracker(ScriptedLauncher::new(browser));

    tracker.start(&account("alice")).expect("start");
    let state = wait_until_idle(&tracker);

    assert!(!state.running);
    assert_eq!(state.account.as_deref(), Some("alice"));
    assert_eq!(state.scraped_count, 3);
    assert_eq!(state.error, None);
    let results = state.results.as_ref().expect("results");
    let ranked: Vec<(&str, u64)> = results
        .iter()
        .map(|record| (record.id.as_str(), record.engagement_score))
        .collect();
    assert_eq!(ranked, vec![("3", 302), ("2", 130), ("1", 110)]);
    assert_eq!(handle.closed(), 1);
}

#[test]
fn second_start_is_rejected_while_running() {
    let gate = Arc::new(Notify::new());
    let launcher = ScriptedLauncher {
        gate: Some(gate.clone()),
        ..ScriptedLauncher::new(ScriptedBrowser::feed(vec![Vec::new()]))
    };
    let tracker = tracker(launcher);

    tracker.start(&account("alice")).expect("first start");
    assert_eq!(
        tracker.start(&account("bob")),
        Err(StartError::AlreadyRunning)
    );
    let during = tracker.read();
    assert!(during.running);
    assert_eq!(during.account.as_deref(), Some("alice"));
    assert_eq!(during.results, None);

    gate.notify_one();
    let state = wait_until_idle(&tracker);
    assert_eq!(state.account.as_deref(), Some("alice"));
    assert_eq!(state.results, Some(Vec::new()));
    assert_eq!(
        state.error.as_deref(),
        Some("No tweets found for @alice. The profile may have very few or no public tweets.")
    );

    tracker.start(&account("bob")).expect("start after finish");
    wait_until_idle(&tracker);
}

#[test]
fn account_failure_is_published_with_empty_results() {
    let browser = ScriptedBrowser {
        layout_ready: true,
        source: "<div>Account suspended</div>".to_string(),
        ..ScriptedBrowser::default()
    };
    let handle = browser.clone();
    let tracker = tracker(ScriptedLauncher::new(browser));

    tracker.start(&account("gone")).expect("start");
    let state = wait_until_idle(&tracker);

    assert_eq!(state.results, Some(Vec::new()));
    assert_eq!(
        state.error.as_deref(),
        Some("The account @gone has been suspended.")
    );
    assert_eq!(handle.closed(), 1);
}

#[test]
fn panicking_job_becomes_a_fault_and_still_closes_the_browser() {
    let browser = ScriptedBrowser {
        panic_on_find: true,
        ..ScriptedBrowser::feed(vec![Vec::new()])
    };
    let handle = browser.clone();
    let tracker = tracker(ScriptedLauncher::new(browser));

    tracker.start(&account("alice")).expect("start");
    let state = wait_until_idle(&tracker);

    assert_eq!(state.results, Some(Vec::new()));
    assert_eq!(
        state.error.as_deref(),
        Some("Error occurred: renderer crashed")
    );
    assert_eq!(handle.closed(), 1);
}

#[test]
fn launch_failure_is_reported_as_a_fault() {
    let launcher = ScriptedLauncher {
        launch_error: Some(BrowserError::Network("connection refused".to_string())),
        ..ScriptedLauncher::new(ScriptedBrowser::default())
    };
    let tracker = tracker(launcher);

    tracker.start(&account("alice")).expect("start");
    let state = wait_until_idle(&tracker);

    assert_eq!(state.results, Some(Vec::new()));
    assert_eq!(
        state.error.as_deref(),
        Some("Error occurred: network error: connection refused")
    );
}

#[test]
fn fresh_tracker_reports_an_idle_state() {
    let tracker = tracker(ScriptedLauncher::new(ScriptedBrowser::default()));
    let state = tracker.read();

    assert!(!tracker.is_running());
    assert_eq!(state.results, None);
    assert_eq!(state.scraped_count, 0);
    assert_eq!(state.limit, 1000);
}
