#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Hand the account to the background worker.
    RunJob { account: String, limit: usize },
}
