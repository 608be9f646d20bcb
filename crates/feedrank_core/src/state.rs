use serde::{Deserialize, Serialize};

use crate::Record;

/// Posts collected per job before ranking.
pub const DEFAULT_LIMIT: usize = 1000;

/// Progress and result of the current (or most recent) job.
///
/// `results` stays `None` until the job publishes its final state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobState {
    pub running: bool,
    pub account: Option<String>,
    pub scraped_count: usize,
    pub limit: usize,
    pub results: Option<Vec<Record>>,
    pub error: Option<String>,
}

impl Default for JobState {
    fn default() -> Self {
        Self {
            running: false,
            account: None,
            scraped_count: 0,
            limit: DEFAULT_LIMIT,
            results: None,
            error: None,
        }
    }
}

impl JobState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Why a job ended without a ranked result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    AccountNotFound,
    AccountSuspended,
    AccountProtected,
    NoContent,
    LoadTimeout,
}

impl FailureKind {
    /// User-facing explanation naming the account.
    pub fn describe(&self, account: &str) -> String {
        match self {
            FailureKind::AccountNotFound => format!("The account @{account} doesn't exist."),
            FailureKind::AccountSuspended => {
                format!("The account @{account} has been suspended.")
            }
            FailureKind::AccountProtected => {
                format!("The account @{account} is private/protected.")
            }
            FailureKind::NoContent => format!("The account @{account} exists but has no tweets."),
            FailureKind::LoadTimeout => format!(
                "Could not load profile for @{account}. Twitter may be experiencing issues or blocking the request."
            ),
        }
    }
}

/// Final result handed back by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Ranked records; may be empty when the feed yielded nothing.
    Collected(Vec<Record>),
    /// The account page explained why there is nothing to rank.
    Failed { kind: FailureKind, message: String },
    /// Failure outside the account page, such as a browser error or a
    /// panic. The detail is shown after "Error occurred: ".
    Faulted(String),
}
