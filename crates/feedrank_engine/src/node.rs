use scraper::{ElementRef, Html, Node, Selector};
use thiserror::Error;
use url::Url;

use crate::selectors::LABELLED;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid selector {selector}: {message}")]
    InvalidSelector { selector: String, message: String },
    #[error("node is no longer readable: {0}")]
    Unreadable(String),
}

/// Text and attributes of one element under a content node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementSnapshot {
    /// Visible text on one line, whitespace runs collapsed.
    pub text: String,
    /// Visible text as written, line breaks kept; only the ends are trimmed.
    pub raw_text: String,
    pub attributes: Vec<(String, String)>,
}

impl ElementSnapshot {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Read-only queries the extractors are allowed to make against one content
/// node. Implemented over parsed snapshots here; tests substitute fakes.
pub trait NodeQuery {
    /// Every element under the node matching `selector`, in document order.
    fn select(&self, selector: &str) -> Result<Vec<ElementSnapshot>, QueryError>;

    /// All non-empty `aria-label` values under the node, in one pass.
    fn label_sweep(&self) -> Result<Vec<String>, QueryError>;

    /// Texts of the `span`s sharing a parent with the first match of `selector`.
    fn sibling_spans(&self, selector: &str) -> Result<Vec<String>, QueryError>;

    /// Page the node was captured from, for resolving relative links.
    fn page_url(&self) -> Option<&Url> {
        None
    }
}

/// Owned snapshot of one rendered content node (its outer HTML).
///
/// Snapshots are plain strings so they can cross await points; call
/// [`FeedNode::parse`] to query one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedNode {
    html: String,
    page_url: Option<Url>,
}

impl FeedNode {
    pub fn new(html: impl Into<String>, page_url: Option<Url>) -> Self {
        Self {
            html: html.into(),
            page_url,
        }
    }

    pub fn parse(&self) -> ParsedNode {
        ParsedNode {
            doc: Html::parse_fragment(&self.html),
            page_url: self.page_url.clone(),
        }
    }
}

pub struct ParsedNode {
    doc: Html,
    page_url: Option<Url>,
}

impl NodeQuery for ParsedNode {
    fn select(&self, selector: &str) -> Result<Vec<ElementSnapshot>, QueryError> {
        let sel = parse_selector(selector)?;
        Ok(self.doc.select(&sel).map(snapshot).collect())
    }

    fn label_sweep(&self) -> Result<Vec<String>, QueryError> {
        let sel = parse_selector(LABELLED)?;
        Ok(self
            .doc
            .select(&sel)
            .filter_map(|el| el.value().attr("aria-label"))
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(ToOwned::to_owned)
            .collect())
    }

    fn sibling_spans(&self, selector: &str) -> Result<Vec<String>, QueryError> {
        let sel = parse_selector(selector)?;
        let span_sel = parse_selector("span")?;

        let Some(anchor) = self.doc.select(&sel).next() else {
            return Ok(Vec::new());
        };
        let Some(parent) = anchor.parent().and_then(ElementRef::wrap) else {
            return Ok(Vec::new());
        };

        Ok(parent
            .select(&span_sel)
            .map(collapse_text)
            .filter(|text| !text.is_empty())
            .collect())
    }

    fn page_url(&self) -> Option<&Url> {
        self.page_url.as_ref()
    }
}

fn parse_selector(selector: &str) -> Result<Selector, QueryError> {
    Selector::parse(selector).map_err(|err| QueryError::InvalidSelector {
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

fn snapshot(el: ElementRef<'_>) -> ElementSnapshot {
    ElementSnapshot {
        text: collapse_text(el),
        raw_text: block_text(el),
        attributes: el
            .value()
            .attrs()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
    }
}

/// Visible text with runs of whitespace collapsed to single spaces.
fn collapse_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn block_text(el: ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(chunk) => text.push_str(chunk),
            Node::Element(element) if element.name() == "br" => text.push('\n'),
            _ => {}
        }
    }
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST: &str = r#"
        <article role="article">
          <div data-testid="User-Name">
            <span>Alice</span><span>@alice</span>
            <div><a href="/alice/status/42"><time datetime="2024-03-01T10:00:00.000Z">Mar 1</time></a><span>·</span><span>2h</span></div>
          </div>
          <div data-testid="tweetText" lang="en"><span>Hello</span>   <span>world</span></div>
          <div role="group" aria-label="3 replies, 5 likes"></div>
          <button aria-label="   "></button>
        </article>"#;

    #[test]
    fn select_snapshots_text_and_attributes() {
        let parsed = FeedNode::new(POST, None).parse();
        let found = parsed.select(r#"[data-testid="tweetText"]"#).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "Hello world");
        assert_eq!(found[0].attr("lang"), Some("en"));
        assert_eq!(found[0].attr("missing"), None);
    }

    #[test]
    fn raw_text_keeps_line_breaks() {
        let html = r#"<div data-testid="tweetText"><span>first line
second</span><br><span>  third  </span></div>"#;
        let found = FeedNode::new(html, None)
            .parse()
            .select(r#"[data-testid="tweetText"]"#)
            .unwrap();
        assert_eq!(found[0].raw_text, "first line\nsecond\n  third");
        assert_eq!(found[0].text, "first line second third");
    }

    #[test]
    fn label_sweep_skips_blank_labels() {
        let parsed = FeedNode::new(POST, None).parse();
        assert_eq!(parsed.label_sweep().unwrap(), vec!["3 replies, 5 likes"]);
    }

    #[test]
    fn sibling_spans_come_from_the_anchor_parent() {
        let parsed = FeedNode::new(POST, None).parse();
        let spans = parsed.sibling_spans(r#"a[href*="/status/"]"#).unwrap();
        assert_eq!(spans, vec!["·", "2h"]);
    }

    #[test]
    fn invalid_selector_is_reported() {
        let parsed = FeedNode::new(POST, None).parse();
        let err = parsed.select("[[").unwrap_err();
        assert!(matches!(err, QueryError::InvalidSelector { .. }));
    }

    #[test]
    fn page_url_is_carried_into_the_parsed_node() {
        let url = Url::parse("https://x.com/alice").unwrap();
        let parsed = FeedNode::new(POST, Some(url.clone())).parse();
        assert_eq!(parsed.page_url(), Some(&url));
    }
}
