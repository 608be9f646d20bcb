use std::sync::LazyLock;

use feedrank_core::{engagement_score, Record, UNKNOWN_ID};
use feedrank_logging::feed_debug;
use regex::Regex;

use crate::selectors::{
    LANG_BLOCK, PROFILE_LINK_TEXT, STATUS_LINK, TEXT_CONTAINER, TIME_ELEMENT, USER_NAME_SPAN,
};
use crate::{extract_metrics, NodeQuery, QueryError};

const DEFAULT_BODY: &str = "No text content";
const DEFAULT_AUTHOR: &str = "Unknown user";

static STATUS_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/status/(\d+)").expect("status id pattern"));

/// Short dates ("Apr 5") and relative ages ("2h", "15m", "3d").
static SHORT_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec|\d+[hmd]\b)")
        .expect("short time pattern")
});

type Stage<T> = fn(&dyn NodeQuery) -> Result<Option<T>, QueryError>;

// Cascades in priority order.
const BODY_STAGES: &[Stage<String>] = &[body_from_text_container, body_from_lang_block];
const AUTHOR_STAGES: &[Stage<String>] = &[author_from_user_name, author_from_profile_link];
const TIMESTAMP_STAGES: &[Stage<String>] =
    &[timestamp_from_time_element, timestamp_near_permalink];
const PERMALINK_STAGES: &[Stage<String>] = &[resolve_permalink];

/// Counts lookups so a node where nothing at all could be read is dropped
/// instead of turned into a record made only of defaults.
#[derive(Default)]
struct Lookups {
    attempted: usize,
    failed: usize,
}

impl Lookups {
    /// Runs `stages` in order; the first one producing a value wins. A stage
    /// error counts as "no value".
    fn first_success<T>(
        &mut self,
        node: &dyn NodeQuery,
        field: &str,
        stages: &[Stage<T>],
    ) -> Option<T> {
        for stage in stages {
            self.attempted += 1;
            match stage(node) {
                Ok(Some(value)) => return Some(value),
                Ok(None) => {}
                Err(err) => {
                    self.failed += 1;
                    feed_debug!("Lookup for {} failed: {}", field, err);
                }
            }
        }
        None
    }

    fn all_failed(&self) -> bool {
        self.attempted > 0 && self.attempted == self.failed
    }
}

/// Builds a scored record from one content node.
///
/// Missing fields fall back to defaults; `None` means the node could not be
/// read at all and should be skipped.
pub fn extract_record(node: &dyn NodeQuery) -> Option<Record> {
    let mut lookups = Lookups::default();

    let body_text = lookups
        .first_success(node, "body", BODY_STAGES)
        .unwrap_or_else(|| DEFAULT_BODY.to_string());
    let author = lookups
        .first_success(node, "author", AUTHOR_STAGES)
        .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());
    let timestamp = lookups.first_success(node, "timestamp", TIMESTAMP_STAGES);
    let permalink = lookups
        .first_success(node, "permalink", PERMALINK_STAGES)
        .unwrap_or_default();

    if lookups.all_failed() {
        feed_debug!("Skipping unreadable node");
        return None;
    }

    let id = status_id(&permalink).unwrap_or_else(|| UNKNOWN_ID.to_string());
    let metrics = extract_metrics(node);
    let engagement_score = engagement_score(&metrics);

    Some(Record {
        id,
        timestamp,
        body_text,
        author: author.trim_start_matches('@').to_string(),
        permalink,
        metrics,
        engagement_score,
    })
}

/// Absolute URL of the node's first status link, if any.
///
/// The permalink is the node's identity during pagination.
pub fn resolve_permalink(node: &dyn NodeQuery) -> Result<Option<String>, QueryError> {
    let href = node
        .select(STATUS_LINK)?
        .into_iter()
        .find_map(|link| link.attr("href").map(str::to_string));

    Ok(href.map(|href| match node.page_url().and_then(|base| base.join(&href).ok()) {
        Some(absolute) => absolute.to_string(),
        None => href,
    }))
}

fn status_id(permalink: &str) -> Option<String> {
    STATUS_ID
        .captures(permalink)
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
}

fn first_text(node: &dyn NodeQuery, selector: &str) -> Result<Option<String>, QueryError> {
    Ok(node
        .select(selector)?
        .into_iter()
        .map(|el| el.text)
        .find(|text| !text.is_empty()))
}

/// Like [`first_text`], but keeps the body's own line breaks.
fn first_block_text(node: &dyn NodeQuery, selector: &str) -> Result<Option<String>, QueryError> {
    Ok(node
        .select(selector)?
        .into_iter()
        .map(|el| el.raw_text)
        .find(|text| !text.is_empty()))
}

fn body_from_text_container(node: &dyn NodeQuery) -> Result<Option<String>, QueryError> {
    first_block_text(node, TEXT_CONTAINER)
}

fn body_from_lang_block(node: &dyn NodeQuery) -> Result<Option<String>, QueryError> {
    first_block_text(node, LANG_BLOCK)
}

fn author_from_user_name(node: &dyn NodeQuery) -> Result<Option<String>, QueryError> {
    first_text(node, USER_NAME_SPAN)
}

fn author_from_profile_link(node: &dyn NodeQuery) -> Result<Option<String>, QueryError> {
    first_text(node, PROFILE_LINK_TEXT)
}

fn timestamp_from_time_element(node: &dyn NodeQuery) -> Result<Option<String>, QueryError> {
    Ok(node
        .select(TIME_ELEMENT)?
        .into_iter()
        .filter_map(|el| el.attr("datetime").map(str::trim).map(str::to_string))
        .find(|datetime| !datetime.is_empty()))
}

fn timestamp_near_permalink(node: &dyn NodeQuery) -> Result<Option<String>, QueryError> {
    Ok(node
        .sibling_spans(STATUS_LINK)?
        .into_iter()
        .find(|text| SHORT_TIME.is_match(text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_id_is_the_numeric_segment() {
        assert_eq!(
            status_id("https://x.com/alice/status/1234567890"),
            Some("1234567890".to_string())
        );
        assert_eq!(
            status_id("https://x.com/alice/status/99/photo/1"),
            Some("99".to_string())
        );
        assert_eq!(status_id("https://x.com/alice"), None);
        assert_eq!(status_id(""), None);
    }

    #[test]
    fn short_time_tokens() {
        for token in ["Apr 5", "Dec 31, 2023", "2h", "15m", "3d"] {
            assert!(SHORT_TIME.is_match(token), "{token}");
        }
        for token in ["·", "alice", "12", "2 hours"] {
            assert!(!SHORT_TIME.is_match(token), "{token}");
        }
    }
}
