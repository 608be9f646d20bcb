use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use feedrank_core::ProgressView;
use feedrank_engine::{account_from_input, JobTracker, StartError};
use feedrank_logging::{feed_info, feed_warn};
use serde::Deserialize;
use serde_json::json;

pub struct AppState {
    pub tracker: JobTracker,
}

#[derive(Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    profile_url: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/scrape", post(start_scrape))
        .route("/progress", get(progress))
        .with_state(state)
}

pub async fn start_scrape(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ScrapeRequest>,
) -> Response {
    // A busy tracker rejects before the input is even looked at.
    if state.tracker.is_running() {
        return rejection(StartError::AlreadyRunning);
    }

    let account = match account_from_input(&body.profile_url) {
        Ok(account) => account,
        Err(err) => return rejection(err),
    };

    match state.tracker.start(&account) {
        Ok(()) => {
            feed_info!("Scrape requested for @{}", account);
            Json(json!({
                "message": format!(
                    "Started scraping tweets for @{account}. This may take a few minutes depending on the account activity."
                )
            }))
            .into_response()
        }
        Err(err) => rejection(err),
    }
}

pub async fn progress(State(state): State<Arc<AppState>>) -> Json<ProgressView> {
    Json(ProgressView::from(state.tracker.read().as_ref()))
}

fn rejection(err: StartError) -> Response {
    let status = match err {
        StartError::AlreadyRunning => StatusCode::CONFLICT,
        StartError::InvalidInput | StartError::InvalidHandle => StatusCode::BAD_REQUEST,
        StartError::EngineUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    };
    feed_warn!("Scrape request rejected: {}", err);
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
