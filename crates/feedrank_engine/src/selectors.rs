//! CSS selectors and page markers for the profile feed.

/// Present once the profile layout has rendered.
pub(crate) const PRIMARY_COLUMN: &str = r#"[data-testid="primaryColumn"]"#;

/// Any of these means at least one post has rendered.
pub(crate) const CONTENT_SELECTORS: &[&str] = &[
    r#"[data-testid="tweet"]"#,
    r#"article[role="article"]"#,
    r#"[data-testid="tweetText"]"#,
];

/// Containers queried on every collecting pass. One post usually matches
/// several of them, so results are deduplicated by permalink.
pub(crate) const CONTENT_CONTAINERS: &[&str] = &[
    r#"[data-testid="tweet"]"#,
    r#"article[role="article"]"#,
    r#"div[data-testid="cellInnerDiv"]"#,
];

pub(crate) const STATUS_LINK: &str = r#"a[href*="/status/"]"#;
pub(crate) const LABELLED: &str = "[aria-label]";

pub(crate) const TEXT_CONTAINER: &str = r#"[data-testid="tweetText"]"#;
pub(crate) const LANG_BLOCK: &str = "div[lang]";
pub(crate) const USER_NAME_SPAN: &str = r#"[data-testid="User-Name"] span"#;
pub(crate) const PROFILE_LINK_TEXT: &str = r#"a[role="link"] div[dir="ltr"]"#;
pub(crate) const TIME_ELEMENT: &str = "time[datetime]";

/// Page text that identifies why a profile has no feed.
pub(crate) const NOT_FOUND_MARKERS: &[&str] = &["This account doesn't exist"];
pub(crate) const SUSPENDED_MARKERS: &[&str] = &["Account suspended"];
pub(crate) const PROTECTED_MARKERS: &[&str] =
    &["These Tweets are protected", "These posts are protected"];
pub(crate) const EMPTY_MARKERS: &[&str] =
    &["This account hasn't Tweeted", "This account hasn't posted"];
