use std::fmt;

/// Stage of the pagination state machine for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    LoadingProfile,
    WaitingForFirstContent,
    Collecting,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::LoadingProfile => write!(f, "loading profile"),
            Phase::WaitingForFirstContent => write!(f, "waiting for first content"),
            Phase::Collecting => write!(f, "collecting"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobProgress {
    pub scraped_count: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    PhaseChanged(Phase),
    Progress(JobProgress),
}
