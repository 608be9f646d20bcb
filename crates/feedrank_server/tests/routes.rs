use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use feedrank_core::ProgressView;
use feedrank_engine::{
    BrowserError, BrowserLauncher, FeedBrowser, JobTracker, ScrapeSettings,
};
use feedrank_server::{router, AppState};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Launcher that either never opens a browser (the job stays running) or
/// fails immediately (the job finishes at once).
struct StubLauncher {
    hang: bool,
}

#[async_trait::async_trait]
impl BrowserLauncher for StubLauncher {
    async fn launch(&self) -> Result<Box<dyn FeedBrowser>, BrowserError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        Err(BrowserError::Network("no driver".to_string()))
    }
}

fn app(hang: bool) -> (Router, Arc<AppState>) {
    feedrank_logging::initialize_for_tests();
    let tracker = JobTracker::new(
        Arc::new(StubLauncher { hang }),
        ScrapeSettings::without_waits(),
    )
    .expect("tracker");
    let state = Arc::new(AppState { tracker });
    (router(state.clone()), state)
}

async fn post_scrape(app: &Router, profile_url: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/scrape")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "profile_url": profile_url }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_progress(app: &Router) -> ProgressView {
    let request = Request::builder()
        .uri("/progress")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn scrape_starts_a_job_and_progress_reports_it() {
    let (app, _state) = app(true);

    let (status, body) = post_scrape(&app, "https://x.com/Alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "message": "Started scraping tweets for @alice. This may take a few minutes depending on the account activity."
        })
    );

    let progress = get_progress(&app).await;
    assert!(progress.is_scraping);
    assert_eq!(progress.scraped_count, 0);
    assert_eq!(progress.limit, 1000);
    assert_eq!(progress.data, None);
    assert_eq!(progress.error, None);
}

#[tokio::test]
async fn busy_tracker_rejects_before_validating_input() {
    let (app, _state) = app(true);
    post_scrape(&app, "alice").await;

    let (status, body) = post_scrape(&app, "not a handle!").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "error": "Already scraping tweets. Please wait." }));
}

#[tokio::test]
async fn unresolvable_input_is_rejected() {
    let (app, state) = app(true);

    let (status, body) = post_scrape(&app, "https://x.com/explore").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid profile URL or username format."));
    assert!(!state.tracker.is_running());
}

#[tokio::test]
async fn overlong_handle_is_rejected() {
    let (app, _state) = app(true);

    let (status, body) = post_scrape(&app, "@abcdefghijklmnopqrstuvwxyz").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid Twitter username format."));
}

#[tokio::test]
async fn failed_job_surfaces_its_error_through_progress() {
    let (app, state) = app(false);

    let (status, _) = post_scrape(&app, "@alice").await;
    assert_eq!(status, StatusCode::OK);

    let deadline = Instant::now() + Duration::from_secs(10);
    while state.tracker.is_running() {
        assert!(Instant::now() < deadline, "job did not finish");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let progress = get_progress(&app).await;
    assert!(!progress.is_scraping);
    assert_eq!(progress.data, Some(Vec::new()));
    assert_eq!(
        progress.error.as_deref(),
        Some("Error occurred: network error: no driver")
    );
}
