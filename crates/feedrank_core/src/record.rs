use serde::{Deserialize, Serialize};

/// Sentinel id used when no status id can be recovered from the permalink.
pub const UNKNOWN_ID: &str = "unknown";

/// Engagement counters recovered for one post. Unrecoverable fields stay 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub reply_count: u64,
    pub retweet_count: u64,
    pub like_count: u64,
    pub bookmark_count: u64,
    pub view_count: u64,
}

impl Metrics {
    /// Number of counters that hold a non-zero value.
    pub fn non_zero_count(&self) -> usize {
        self.values().iter().filter(|value| **value > 0).count()
    }

    /// True when at least one counter is still 0.
    pub fn has_missing(&self) -> bool {
        self.non_zero_count() < 5
    }

    fn values(&self) -> [u64; 5] {
        [
            self.reply_count,
            self.retweet_count,
            self.like_count,
            self.bookmark_count,
            self.view_count,
        ]
    }
}

/// One scored post. The serialized field names are the ones the progress
/// endpoint has always reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(rename = "date")]
    pub timestamp: Option<String>,
    #[serde(rename = "content")]
    pub body_text: String,
    #[serde(rename = "user")]
    pub author: String,
    #[serde(rename = "url")]
    pub permalink: String,
    #[serde(flatten)]
    pub metrics: Metrics,
    pub engagement_score: u64,
}
