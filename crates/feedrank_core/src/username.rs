use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Top-level paths of the site that are never account names.
pub const RESERVED_SEGMENTS: &[&str] = &["home", "explore", "notifications", "messages", "search"];

/// Tried in order; the first capture that is not a reserved segment wins.
static PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?:twitter\.com|x\.com)/([^/?#]+)").expect("profile url pattern"),
        Regex::new(r"@([a-z0-9_]+)").expect("at-handle pattern"),
        Regex::new(r"^([a-z0-9_]+)$").expect("bare handle pattern"),
    ]
});

static HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{1,15}$").expect("handle pattern"));

/// Normalizes a profile URL, `@handle` or bare handle into a lowercase
/// account name. Returns `None` when nothing usable is found.
pub fn resolve_username(input: &str) -> Option<String> {
    let input = input.trim().to_lowercase();

    for pattern in PATTERNS.iter() {
        let Some(caps) = pattern.captures(&input) else {
            continue;
        };
        let Some(found) = caps.get(1) else {
            continue;
        };
        let name = found.as_str().trim_start_matches('@');
        if name.is_empty() || RESERVED_SEGMENTS.contains(&name) {
            continue;
        }
        return Some(name.to_string());
    }

    None
}

/// Handle format accepted by the site: 1-15 letters, digits or underscores.
pub fn is_valid_handle(handle: &str) -> bool {
    HANDLE.is_match(handle)
}

/// An account name that passed [`is_valid_handle`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(handle: impl Into<String>) -> Option<Self> {
        let handle = handle.into();
        is_valid_handle(&handle).then_some(Self(handle))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
