use crate::{Effect, JobOutcome, JobState, Msg};

/// Pure update function: applies a message to job state and returns any effects.
pub fn update(mut state: JobState, msg: Msg) -> (JobState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartRequested { account, limit } => {
            // Single-flight: a second start while running is dropped here as well
            // as rejected by the tracker.
            if state.running {
                return (state, Vec::new());
            }
            state = JobState {
                running: true,
                account: Some(account.clone()),
                scraped_count: 0,
                limit,
                results: None,
                error: None,
            };
            vec![Effect::RunJob { account, limit }]
        }
        Msg::Progress { scraped_count } => {
            if state.running {
                state.scraped_count = scraped_count;
            }
            Vec::new()
        }
        Msg::Finished(outcome) => {
            if !state.running {
                return (state, Vec::new());
            }
            let account = state.account.clone().unwrap_or_default();
            match outcome {
                JobOutcome::Collected(records) => {
                    if records.is_empty() {
                        state.error.get_or_insert_with(|| {
                            format!(
                                "No tweets found for @{account}. The profile may have very few or no public tweets."
                            )
                        });
                    }
                    state.results = Some(records);
                }
                JobOutcome::Failed { message, .. } => {
                    state.results = Some(Vec::new());
                    state.error = Some(message);
                }
                JobOutcome::Faulted(detail) => {
                    state.results = Some(Vec::new());
                    state.error = Some(format!("Error occurred: {detail}"));
                }
            }
            state.running = false;
            Vec::new()
        }
    };

    (state, effects)
}
