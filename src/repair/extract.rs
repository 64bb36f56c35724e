//! Pulling replacement source out of free-form oracle output.

use std::sync::LazyLock;

use regex::Regex;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n(.*?)```").expect("valid regex")
});

const USAGE_MARKER: &str = "Total usage est:";

/// Pulls replacement source out of raw oracle output.
///
/// Prefers the first fenced code block. Failing that, takes everything from
/// the first `package ` declaration, and finally the whole output; in both
/// fallbacks a trailing usage-statistics section is cut off.
#[must_use]
pub fn extract_source(raw: &str) -> String {
    if let Some(block) = FENCED_BLOCK.captures(raw).and_then(|c| c.get(1)) {
        return block.as_str().trim().to_string();
    }
    let body = raw.find("package ").map_or(raw, |start| &raw[start..]);
    let body = body.find(USAGE_MARKER).map_or(body, |end| &body[..end]);
    body.trim().to_string()
}
