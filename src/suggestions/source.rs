use async_trait::async_trait;

use super::types::{SuggestError, Suggestion};

/// Where suggestions come from.
///
/// Results are expected to be ranked already; the engine never re-sorts them.
/// An empty query asks for the initial ("recent / frequent") list.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Suggestion>, SuggestError>;

    /// Name of this source for logging/debugging
    fn name(&self) -> &'static str;
}
