#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Caller asked for a job on an already validated account.
    StartRequested { account: String, limit: usize },
    /// Worker accepted another record.
    Progress { scraped_count: usize },
    /// Worker reached a terminal state.
    Finished(crate::JobOutcome),
}
