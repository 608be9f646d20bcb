use std::any::Any;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use arc_swap::ArcSwap;
use feedrank_core::{resolve_username, update, AccountId, Effect, JobOutcome, JobState, Msg};
use feedrank_logging::{feed_debug, feed_error, feed_info, feed_warn};
use futures_util::FutureExt;
use thiserror::Error;

use crate::{BrowserLauncher, EngineEvent, PaginationController, ProgressSink, ScrapeSettings};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("Already scraping tweets. Please wait.")]
    AlreadyRunning,
    #[error(
        "Invalid profile URL or username format. Please enter a valid Twitter/X profile URL \
         (e.g., https://twitter.com/username or https://x.com/username) or just the username."
    )]
    InvalidInput,
    #[error(
        "Invalid Twitter username format. Twitter usernames can only contain letters, numbers, \
         and underscores, and must be 15 characters or less."
    )]
    InvalidHandle,
    #[error("The scraping engine is not available.")]
    EngineUnavailable,
}

/// Resolves free-form user input to a validated account.
pub fn account_from_input(raw: &str) -> Result<AccountId, StartError> {
    let name = resolve_username(raw).ok_or(StartError::InvalidInput)?;
    AccountId::new(name).ok_or(StartError::InvalidHandle)
}

enum EngineCommand {
    Run { account: String, limit: usize },
}

/// State visible to readers plus the single-flight guard.
///
/// Writes are serialized: `start` writes only after winning the flag, and
/// afterwards only the job's own task writes until it clears the flag.
struct Shared {
    state: ArcSwap<JobState>,
    running: AtomicBool,
}

impl Shared {
    fn apply(&self, msg: Msg) -> Vec<Effect> {
        let current = JobState::clone(&self.state.load());
        let (next, effects) = update(current, msg);
        self.state.store(Arc::new(next));
        effects
    }
}

struct TrackerSink {
    shared: Arc<Shared>,
}

impl ProgressSink for TrackerSink {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::PhaseChanged(phase) => feed_debug!("Job phase: {}", phase),
            EngineEvent::Progress(progress) => {
                self.shared.apply(Msg::Progress {
                    scraped_count: progress.scraped_count,
                });
            }
        }
    }
}

/// Owns the one scrape job the process may run at a time.
///
/// Jobs execute on a tokio runtime owned by a dedicated thread; `start` only
/// hands a command over the channel and never blocks on the job.
pub struct JobTracker {
    shared: Arc<Shared>,
    cmd_tx: mpsc::Sender<EngineCommand>,
    limit: usize,
}

impl JobTracker {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, settings: ScrapeSettings) -> io::Result<Self> {
        let shared = Arc::new(Shared {
            state: ArcSwap::from_pointee(JobState {
                limit: settings.limit,
                ..JobState::default()
            }),
            running: AtomicBool::new(false),
        });
        let limit = settings.limit;
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let worker_shared = shared.clone();
        thread::Builder::new()
            .name("feedrank-engine".to_string())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    let EngineCommand::Run { account, limit } = command;
                    let job_settings = ScrapeSettings {
                        limit,
                        ..settings.clone()
                    };
                    runtime.spawn(run_job(
                        launcher.clone(),
                        job_settings,
                        worker_shared.clone(),
                        account,
                    ));
                }
                feed_debug!("Engine command channel closed");
            })?;

        Ok(Self {
            shared,
            cmd_tx,
            limit,
        })
    }

    /// Starts a job for `account` unless one is already in progress.
    pub fn start(&self, account: &AccountId) -> Result<(), StartError> {
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StartError::AlreadyRunning);
        }

        let effects = self.shared.apply(Msg::StartRequested {
            account: account.as_str().to_string(),
            limit: self.limit,
        });
        for effect in effects {
            let Effect::RunJob { account, limit } = effect;
            if self.cmd_tx.send(EngineCommand::Run { account, limit }).is_err() {
                feed_error!("Engine thread is gone; cannot start job");
                self.shared.apply(Msg::Finished(JobOutcome::Faulted(
                    StartError::EngineUnavailable.to_string(),
                )));
                self.shared.running.store(false, Ordering::Release);
                return Err(StartError::EngineUnavailable);
            }
        }
        feed_info!("Started job for @{}", account);
        Ok(())
    }

    /// Latest published snapshot. Never blocks on the running job.
    pub fn read(&self) -> Arc<JobState> {
        self.shared.state.load_full()
    }

    /// True from a successful `start` until the final snapshot is published.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }
}

async fn run_job(
    launcher: Arc<dyn BrowserLauncher>,
    settings: ScrapeSettings,
    shared: Arc<Shared>,
    account: String,
) {
    let outcome = match launcher.launch().await {
        Ok(mut browser) => {
            let controller = PaginationController::new(settings);
            let sink = TrackerSink {
                shared: shared.clone(),
            };
            let outcome = AssertUnwindSafe(controller.run(browser.as_mut(), &account, &sink))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    let detail = panic_message(panic.as_ref());
                    feed_error!("Job for @{} panicked: {}", account, detail);
                    JobOutcome::Faulted(detail)
                });
            if let Err(err) = browser.close().await {
                feed_warn!("Closing browser for @{} failed: {}", account, err);
            }
            outcome
        }
        Err(err) => {
            feed_error!("Could not launch browser for @{}: {}", account, err);
            JobOutcome::Faulted(err.to_string())
        }
    };

    if let JobOutcome::Collected(records) = &outcome {
        feed_info!("Job for @{} finished with {} ranked posts", account, records.len());
    }
    shared.apply(Msg::Finished(outcome));
    shared.running.store(false, Ordering::Release);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "job panicked".to_string()
    }
}
