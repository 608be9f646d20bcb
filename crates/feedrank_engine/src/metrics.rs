use std::sync::LazyLock;

use feedrank_core::{parse_count, Metrics};
use feedrank_logging::feed_debug;
use regex::Regex;

use crate::selectors::LABELLED;
use crate::{NodeQuery, QueryError};

/// Stage 1 stops scanning once this many counters are known.
const ENOUGH_METRICS: usize = 3;

/// A count followed by one of the metric's words, e.g. `"1,204 reposts"`.
static PATTERNS: LazyLock<[Regex; 5]> = LazyLock::new(|| {
    let pattern = |words: &str| {
        Regex::new(&format!(r"(?i)(\d[\d,]*(?:\.\d+)?[km]?)\s+(?:{words})\b"))
            .expect("metric pattern")
    };
    [
        pattern("replies|reply"),
        pattern("reposts|repost|retweets|retweet"),
        pattern("likes|like"),
        pattern("bookmarks|bookmark"),
        pattern("views|view"),
    ]
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Reply,
    Retweet,
    Like,
    Bookmark,
    View,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Reply,
        MetricKind::Retweet,
        MetricKind::Like,
        MetricKind::Bookmark,
        MetricKind::View,
    ];

    fn pattern(self) -> &'static Regex {
        &PATTERNS[self as usize]
    }

    /// `data-testid` values of the action button for this metric. The site
    /// swaps the id once the viewer has interacted with the post.
    fn test_ids(self) -> &'static [&'static str] {
        match self {
            MetricKind::Reply => &["reply"],
            MetricKind::Retweet => &["retweet", "unretweet"],
            MetricKind::Like => &["like", "unlike"],
            MetricKind::Bookmark => &["bookmark", "removeBookmark"],
            MetricKind::View => &["view"],
        }
    }

    /// Count for this metric in `label`, or 0 when the label has none.
    pub fn read(self, label: &str) -> u64 {
        self.pattern()
            .captures(label)
            .and_then(|caps| caps.get(1))
            .map(|count| parse_count(count.as_str()))
            .unwrap_or(0)
    }

    fn get(self, metrics: &Metrics) -> u64 {
        match self {
            MetricKind::Reply => metrics.reply_count,
            MetricKind::Retweet => metrics.retweet_count,
            MetricKind::Like => metrics.like_count,
            MetricKind::Bookmark => metrics.bookmark_count,
            MetricKind::View => metrics.view_count,
        }
    }

    fn slot(self, metrics: &mut Metrics) -> &mut u64 {
        match self {
            MetricKind::Reply => &mut metrics.reply_count,
            MetricKind::Retweet => &mut metrics.retweet_count,
            MetricKind::Like => &mut metrics.like_count,
            MetricKind::Bookmark => &mut metrics.bookmark_count,
            MetricKind::View => &mut metrics.view_count,
        }
    }

    /// Stores `value` only if the counter is still unknown.
    fn fill(self, metrics: &mut Metrics, value: u64) {
        let slot = self.slot(metrics);
        if *slot == 0 {
            *slot = value;
        }
    }
}

/// Recovers the five engagement counters of one content node.
///
/// Three stages run in order of decreasing reliability, each only filling
/// counters that are still 0. A failing stage is skipped, never fatal.
pub fn extract_metrics(node: &dyn NodeQuery) -> Metrics {
    let mut metrics = Metrics::default();

    if let Err(err) = combined_label_stage(node, &mut metrics) {
        feed_debug!("Combined label stage skipped: {}", err);
    }
    labelled_button_stage(node, &mut metrics);
    if metrics.has_missing() {
        if let Err(err) = label_sweep_stage(node, &mut metrics) {
            feed_debug!("Label sweep stage skipped: {}", err);
        }
    }

    metrics
}

/// One accessible description carrying several counts at once, such as
/// `"12 replies, 4 reposts, 300 likes, 2 bookmarks, 5000 views"`.
fn combined_label_stage(node: &dyn NodeQuery, metrics: &mut Metrics) -> Result<(), QueryError> {
    for element in node.select(LABELLED)? {
        let Some(label) = element.attr("aria-label") else {
            continue;
        };
        let matched = MetricKind::ALL
            .iter()
            .filter(|kind| kind.pattern().is_match(label))
            .count();
        if matched < 2 {
            continue;
        }

        for kind in MetricKind::ALL {
            kind.fill(metrics, kind.read(label));
        }
        if metrics.non_zero_count() >= ENOUGH_METRICS {
            break;
        }
    }
    Ok(())
}

/// Per-metric action buttons whose own label holds that metric's count.
fn labelled_button_stage(node: &dyn NodeQuery, metrics: &mut Metrics) {
    for kind in MetricKind::ALL {
        if kind.get(metrics) != 0 {
            continue;
        }
        'ids: for test_id in kind.test_ids() {
            let selector = format!(r#"[data-testid="{test_id}"]"#);
            let elements = match node.select(&selector) {
                Ok(elements) => elements,
                Err(err) => {
                    feed_debug!("Button lookup for {:?} failed: {}", kind, err);
                    continue;
                }
            };
            for element in elements {
                if let Some(label) = element.attr("aria-label") {
                    kind.fill(metrics, kind.read(label));
                }
                if kind.get(metrics) != 0 {
                    break 'ids;
                }
            }
        }
    }
}

/// Last resort: every label under the node, matched against every missing metric.
fn label_sweep_stage(node: &dyn NodeQuery, metrics: &mut Metrics) -> Result<(), QueryError> {
    for label in node.label_sweep()? {
        for kind in MetricKind::ALL {
            if kind.get(metrics) == 0 {
                kind.fill(metrics, kind.read(&label));
            }
        }
    }
    Ok(())
}
