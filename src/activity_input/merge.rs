use once_cell::sync::Lazy;
use regex::Regex;

use crate::suggestions::{Suggestion, SuggestionKind};

// `#` plus whatever word characters were typed so far, at the very end of the input
static TRAILING_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\w*$").expect("valid trailing tag regex"));

// tokens that survive an activity suggestion being applied
static MARKER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\w+|![0-9]").expect("valid marker regex"));

/// Merge a chosen suggestion back into the text being typed.
///
/// A tag completes the partial `#...` token at the end of the input (or is
/// appended). An activity replaces the free text and keeps the markers already
/// typed, in order, after it.
pub fn apply_suggestion(input: &str, suggestion: &Suggestion) -> String {
    match suggestion.kind {
        SuggestionKind::Tag => apply_tag(input, &suggestion.text),
        SuggestionKind::Activity => apply_activity(input, &suggestion.text),
    }
}

fn apply_tag(input: &str, tag: &str) -> String {
    let tag = tag.trim_start_matches('#');
    let trimmed = input.trim_end();

    // a trailing space means the user already finished the last token
    let ends_with_space = trimmed.len() != input.len();

    let base = match TRAILING_TAG_REGEX.find(trimmed) {
        Some(m) if !ends_with_space => &trimmed[..m.start()],
        _ if trimmed.is_empty() => "",
        _ => {
            return format!("{trimmed} #{tag} ");
        }
    };

    format!("{base}#{tag} ")
}

fn apply_activity(input: &str, text: &str) -> String {
    let markers = MARKER_REGEX
        .find_iter(input)
        .map(|m| m.as_str())
        .collect::<Vec<_>>();

    if markers.is_empty() {
        return format!("{text} ");
    }

    format!("{text} {} ", markers.join(" "))
}
