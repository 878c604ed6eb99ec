use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"#(\w+)").expect("valid tag regex"));

static PRIORITY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!([1-3])").expect("valid priority regex"));

// strips every `!digit`, including the ones that never count as a priority
static PRIORITY_TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"![0-9]").expect("valid priority token regex"));

static WHITESPACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Structured fields recovered from a line of free-form activity text.
///
/// Always recomputed from `original_text`; never stored on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedActivity {
    pub original_text: String,
    pub clean_text: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    /// Not part of the text grammar. Filled in by the focus prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_rating: Option<u8>,
}

/// Parse raw input. Total: malformed markers are simply left in the clean text.
pub fn parse(text: &str) -> ParsedActivity {
    ParsedActivity {
        original_text: text.to_string(),
        clean_text: clean_text(text),
        tags: extract_tags(text),
        priority: extract_priority(text),
        focus_rating: None,
    }
}

/// Every `#word` in order of appearance, duplicates included.
pub fn extract_tags(text: &str) -> Vec<String> {
    TAG_REGEX
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Value of the first `!1`, `!2` or `!3`.
pub fn extract_priority(text: &str) -> Option<u8> {
    PRIORITY_REGEX
        .captures(text)
        .and_then(|caps| caps[1].parse::<u8>().ok())
}

/// Strip tag and priority tokens in a single pass, then normalize whitespace.
pub fn clean_text(text: &str) -> String {
    let without_tags = TAG_REGEX.replace_all(text, "");
    let without_priority = PRIORITY_TOKEN_REGEX.replace_all(&without_tags, "");

    WHITESPACE_REGEX
        .replace_all(&without_priority, " ")
        .trim()
        .to_string()
}
