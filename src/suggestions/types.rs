use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Activity,
    Tag,
}

impl Display for SuggestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestionKind::Activity => write!(f, "activity"),
            SuggestionKind::Tag => write!(f, "tag"),
        }
    }
}

/// A ranked completion candidate. `id` is the stable identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub frequency: u64,
    #[serde(
        rename = "lastUsed",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_used: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SuggestError {
    /// The request was superseded or torn down. Never shown to the user.
    #[error("suggestion request cancelled")]
    Cancelled,

    #[error("Could not reach the suggestion service: {0}")]
    Network(String),

    #[error("Suggestion service responded with status {0}")]
    Status(u16),

    #[error("Suggestion service error: {0}")]
    Server(String),

    #[error("Received malformed suggestions: {0}")]
    Malformed(String),
}

impl SuggestError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SuggestError::Cancelled)
    }
}
