use crate::{Metrics, Record};

/// Number of records kept after ranking.
pub const TOP_RESULTS: usize = 20;

/// Views that double the base engagement.
const VIEWS_PER_FACTOR: f64 = 10_000.0;

/// Combines metrics into one ranking value.
///
/// `(3 * replies + 2 * retweets + likes + 1.5 * bookmarks) * (1 + views / 10000)`,
/// with the view factor only applied when views are known. Ties at `.5` round
/// to the even neighbour.
pub fn engagement_score(metrics: &Metrics) -> u64 {
    let base = 3.0 * metrics.reply_count as f64
        + 2.0 * metrics.retweet_count as f64
        + metrics.like_count as f64
        + 1.5 * metrics.bookmark_count as f64;

    let impression_factor = if metrics.view_count > 0 {
        1.0 + metrics.view_count as f64 / VIEWS_PER_FACTOR
    } else {
        1.0
    };

    // Float-to-int casts saturate, so huge scores clamp to u64::MAX.
    (base * impression_factor).round_ties_even() as u64
}

/// Orders records by score, highest first, and keeps the best `top_n`.
///
/// The sort is stable: equal scores keep their collection order.
pub fn rank_records(mut records: Vec<Record>, top_n: usize) -> Vec<Record> {
    records.sort_by(|a, b| b.engagement_score.cmp(&a.engagement_score));
    records.truncate(top_n);
    records
}
