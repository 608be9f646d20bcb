use serde::{Deserialize, Serialize};

use crate::{JobState, Record};

/// Body of the progress endpoint: a read-only projection of [`JobState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressView {
    pub is_scraping: bool,
    pub scraped_count: usize,
    pub limit: usize,
    pub data: Option<Vec<Record>>,
    pub error: Option<String>,
}

impl From<&JobState> for ProgressView {
    fn from(state: &JobState) -> Self {
        Self {
            is_scraping: state.running,
            scraped_count: state.scraped_count,
            limit: state.limit,
            data: state.results.clone(),
            error: state.error.clone(),
        }
    }
}
