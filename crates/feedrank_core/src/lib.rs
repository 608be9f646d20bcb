//! Feedrank core: pure parsing, scoring and job-state logic.
mod count;
mod effect;
mod msg;
mod record;
mod score;
mod state;
mod update;
mod username;
mod view_model;

pub use count::parse_count;
pub use effect::Effect;
pub use msg::Msg;
pub use record::{Metrics, Record, UNKNOWN_ID};
pub use score::{engagement_score, rank_records, TOP_RESULTS};
pub use state::{FailureKind, JobOutcome, JobState, DEFAULT_LIMIT};
pub use update::update;
pub use username::{is_valid_handle, resolve_username, AccountId, RESERVED_SEGMENTS};
pub use view_model::ProgressView;
