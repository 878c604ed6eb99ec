//! Incremental suggestions for the activity input.
//!
//! A [`SuggestionEngine`] owns one input widget's query lifecycle: it gates
//! and debounces queries, runs them against a [`SuggestionSource`], drops
//! stale or cancelled responses and keeps the keyboard selection over the
//! results.

mod engine;
mod local;
mod remote;
mod source;
mod types;

pub use engine::{EngineConfig, EngineState, SuggestionEngine};
pub use local::LocalSuggestionSource;
pub use remote::RemoteSuggestionSource;
pub use source::SuggestionSource;
pub use types::{SuggestError, Suggestion, SuggestionKind, SuggestionsResponse};
