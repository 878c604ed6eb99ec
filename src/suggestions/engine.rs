use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::{sync::watch, task::JoinHandle};
use tracing::Instrument;

use super::{
    source::SuggestionSource,
    types::{SuggestError, Suggestion, SuggestionKind},
};

const DEFAULT_DEBOUNCE_MS: u64 = 150;
const DEFAULT_MIN_QUERY_LENGTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Quiet window a non-empty query has to survive before it is searched.
    pub debounce: Duration,
    /// Non-empty queries shorter than this (in characters) are not searched.
    pub min_query_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            min_query_length: DEFAULT_MIN_QUERY_LENGTH,
        }
    }
}

/// Everything an input widget renders from.
///
/// `selected_index` is `None` when nothing is selected, otherwise a valid
/// index into `suggestions`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineState {
    pub query: String,
    pub suggestions: Vec<Suggestion>,
    pub selected_index: Option<usize>,
    pub is_loading: bool,
    /// A non-empty query is waiting out its debounce window.
    pub is_debouncing: bool,
    pub error: Option<SuggestError>,
    /// Query of the last search that was actually issued.
    pub last_query: Option<String>,
    /// Bumped whenever a search is issued or cancelled. Only a response
    /// carrying the current generation may touch the state.
    pub generation: u64,
}

impl EngineState {
    pub fn activity_suggestions(&self) -> Vec<Suggestion> {
        self.of_kind(SuggestionKind::Activity)
    }

    pub fn tag_suggestions(&self) -> Vec<Suggestion> {
        self.of_kind(SuggestionKind::Tag)
    }

    pub fn selected_suggestion(&self) -> Option<&Suggestion> {
        self.selected_index.and_then(|idx| self.suggestions.get(idx))
    }

    fn of_kind(&self, kind: SuggestionKind) -> Vec<Suggestion> {
        self.suggestions
            .iter()
            .filter(|s| s.kind == kind)
            .cloned()
            .collect()
    }
}

#[derive(Default)]
struct Tasks {
    debounce: Option<JoinHandle<()>>,
    /// Identifies the armed debounce timer. A timer that already woke up
    /// cannot be aborted, so it has to present this before issuing.
    debounce_seq: u64,
    in_flight: Option<JoinHandle<()>>,
}

impl Tasks {
    fn disarm_debounce(&mut self) {
        self.debounce_seq += 1;
        if let Some(handle) = self.debounce.take() {
            handle.abort();
        }
    }
}

enum Trigger {
    Now,
    Debounced(u64),
}

struct Shared {
    source: Arc<dyn SuggestionSource>,
    state: watch::Sender<EngineState>,
    tasks: Mutex<Tasks>,
}

impl Shared {
    fn tasks(&self) -> MutexGuard<'_, Tasks> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a search, superseding whatever is in flight. A debounced
    /// trigger is dropped if its timer was disarmed in the meantime.
    fn issue(self: &Arc<Self>, query: String, trigger: Trigger) {
        let mut tasks = self.tasks();

        match trigger {
            Trigger::Debounced(seq) if seq != tasks.debounce_seq => {
                log::debug!("debounce timer {seq} was superseded, not searching {query:?}");
                return;
            }
            // the handle belongs to the running timer itself, dropping it detaches
            Trigger::Debounced(_) => tasks.debounce = None,
            Trigger::Now => tasks.disarm_debounce(),
        }

        if let Some(handle) = tasks.in_flight.take() {
            handle.abort();
        }

        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            state.is_loading = true;
            state.is_debouncing = false;
            state.last_query = Some(query.clone());
            generation = state.generation;
        });

        let span = tracing::debug_span!("suggest", source = self.source.name(), generation);
        let shared = self.clone();

        tasks.in_flight = Some(tokio::spawn(
            async move {
                log::debug!("searching {query:?}");
                let result = shared.source.search(&query).await;
                shared.apply(generation, result);
            }
            .instrument(span),
        ));
    }

    fn apply(&self, generation: u64, result: Result<Vec<Suggestion>, SuggestError>) {
        self.state.send_if_modified(|state| {
            if state.generation != generation {
                log::debug!(
                    "dropping stale response (generation {generation}, current {})",
                    state.generation
                );
                return false;
            }

            state.is_loading = false;

            match result {
                Ok(suggestions) => {
                    state.error = None;
                    // identical payloads keep the current list and selection
                    if state.suggestions != suggestions {
                        state.suggestions = suggestions;
                        state.selected_index = None;
                    }
                }
                Err(err) if err.is_cancellation() => {}
                Err(err) => {
                    log::warn!("suggestion search failed: {err}");
                    state.error = Some(err);
                }
            }

            true
        });
    }

    /// Abort the debounce timer and the in-flight request, and make sure a
    /// late response cannot land.
    fn cancel_all(&self) {
        let mut tasks = self.tasks();

        tasks.disarm_debounce();
        if let Some(handle) = tasks.in_flight.take() {
            handle.abort();
        }

        self.state.send_modify(|state| {
            state.generation += 1;
            state.is_loading = false;
            state.is_debouncing = false;
        });
    }
}

/// Query lifecycle and selection state for one input widget.
///
/// Must be used from within a tokio runtime. Instances share nothing; pending
/// work is cancelled on [`cleanup`](SuggestionEngine::cleanup) and on drop.
pub struct SuggestionEngine {
    shared: Arc<Shared>,
    config: EngineConfig,
}

impl SuggestionEngine {
    pub fn new(source: Arc<dyn SuggestionSource>, config: EngineConfig) -> Self {
        let (state, _) = watch::channel(EngineState::default());

        Self {
            shared: Arc::new(Shared {
                source,
                state,
                tasks: Mutex::new(Tasks::default()),
            }),
            config,
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    // ===== SELECTORS =====

    pub fn state(&self) -> EngineState {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.shared.state.subscribe()
    }

    pub fn query(&self) -> String {
        self.shared.state.borrow().query.clone()
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        self.shared.state.borrow().suggestions.clone()
    }

    pub fn activity_suggestions(&self) -> Vec<Suggestion> {
        self.shared.state.borrow().activity_suggestions()
    }

    pub fn tag_suggestions(&self) -> Vec<Suggestion> {
        self.shared.state.borrow().tag_suggestions()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.state.borrow().is_loading
    }

    pub fn error(&self) -> Option<SuggestError> {
        self.shared.state.borrow().error.clone()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.shared.state.borrow().selected_index
    }

    pub fn selected_suggestion(&self) -> Option<Suggestion> {
        self.shared.state.borrow().selected_suggestion().cloned()
    }

    // ===== SEARCH =====

    /// Update the query bound to the input and search for it.
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();

        self.shared.state.send_modify(|state| {
            state.query = query.clone();
            state.selected_index = None;
        });

        self.perform_search(&query);
    }

    /// Search for `query` following the triggering policy:
    /// - empty: searched immediately (initial suggestions)
    /// - shorter than `min_query_length`: nothing is searched, list is cleared
    /// - otherwise: searched once the query has been quiet for `debounce`
    pub fn perform_search(&self, query: &str) {
        if query.is_empty() {
            self.search_now(String::new());
            return;
        }

        if query.chars().count() < self.config.min_query_length {
            log::debug!("query {query:?} below minimum length, not searching");
            self.shared.cancel_all();
            self.shared.state.send_if_modified(|state| {
                if state.suggestions.is_empty() {
                    return false;
                }
                state.suggestions.clear();
                state.selected_index = None;
                true
            });
            return;
        }

        let mut tasks = self.shared.tasks();
        tasks.disarm_debounce();
        let seq = tasks.debounce_seq;

        let shared = self.shared.clone();
        let query = query.to_string();
        let delay = self.config.debounce;

        self.shared.state.send_if_modified(|state| {
            !std::mem::replace(&mut state.is_debouncing, true)
        });

        tasks.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.issue(query, Trigger::Debounced(seq));
        }));
    }

    /// Fetch the suggestions shown before anything is typed.
    pub fn get_initial_suggestions(&self) {
        self.search_now(String::new());
    }

    /// Re-issue the last search, typically after an error.
    pub fn retry(&self) {
        let query = self
            .shared
            .state
            .borrow()
            .last_query
            .clone()
            .unwrap_or_default();

        log::info!("retrying suggestions for {query:?}");
        self.search_now(query);
    }

    /// Cancel every pending timer and request. Call when the input goes away.
    pub fn cleanup(&self) {
        self.shared.cancel_all();
    }

    /// Wait until no debounce timer is pending and no request is in flight.
    pub async fn settle(&self) -> EngineState {
        let mut rx = self.subscribe();
        rx.wait_for(|state| !state.is_debouncing && !state.is_loading)
            .await
            .map(|state| state.clone())
            .unwrap_or_else(|_| self.state())
    }

    fn search_now(&self, query: String) {
        self.shared.issue(query, Trigger::Now);
    }

    // ===== NAVIGATION =====

    /// Move the selection down. Past the last item the selection is cleared.
    pub fn select_next(&self) {
        self.shared.state.send_if_modified(|state| {
            let len = state.suggestions.len();
            if len == 0 {
                return false;
            }

            state.selected_index = match state.selected_index {
                None => Some(0),
                Some(idx) if idx + 1 < len => Some(idx + 1),
                Some(_) => None,
            };
            true
        });
    }

    /// Move the selection up. Above the first item the selection is cleared;
    /// it never wraps around to the last item.
    pub fn select_previous(&self) {
        self.shared.state.send_if_modified(|state| {
            if state.suggestions.is_empty() {
                return false;
            }

            match state.selected_index {
                None => false,
                Some(0) => {
                    state.selected_index = None;
                    true
                }
                Some(idx) => {
                    state.selected_index = Some(idx - 1);
                    true
                }
            }
        });
    }

    /// Select `idx` if it points at a suggestion. Returns whether it did;
    /// out-of-range indexes leave the selection untouched.
    pub fn select_index(&self, idx: usize) -> bool {
        self.shared.state.send_if_modified(|state| {
            if idx >= state.suggestions.len() {
                return false;
            }
            state.selected_index = Some(idx);
            true
        })
    }

    /// The suggestion to activate, if one is selected.
    pub fn select_current(&self) -> Option<Suggestion> {
        self.selected_suggestion()
    }
}

impl Drop for SuggestionEngine {
    fn drop(&mut self) {
        self.shared.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct Silent;

    #[async_trait]
    impl SuggestionSource for Silent {
        async fn search(&self, _query: &str) -> Result<Vec<Suggestion>, SuggestError> {
            std::future::pending().await
        }

        fn name(&self) -> &'static str {
            "silent"
        }
    }

    fn item(id: &str) -> Suggestion {
        Suggestion {
            id: id.to_string(),
            text: id.to_string(),
            kind: SuggestionKind::Activity,
            frequency: 0,
            last_used: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_for_old_generation_is_ignored() {
        let engine = SuggestionEngine::new(Arc::new(Silent), EngineConfig::default());

        engine.get_initial_suggestions();
        let first = engine.state().generation;
        engine.get_initial_suggestions();
        let second = engine.state().generation;
        assert!(second > first);

        // a response that slipped past cancellation
        engine.shared.apply(first, Ok(vec![item("stale")]));
        assert!(engine.suggestions().is_empty());
        assert!(engine.is_loading());

        engine.shared.apply(second, Ok(vec![item("fresh")]));
        assert_eq!(engine.suggestions()[0].id, "fresh");
        assert!(!engine.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_after_cleanup_is_ignored() {
        let engine = SuggestionEngine::new(Arc::new(Silent), EngineConfig::default());

        engine.get_initial_suggestions();
        let generation = engine.state().generation;
        engine.cleanup();

        engine
            .shared
            .apply(generation, Err(SuggestError::Network("late".to_string())));
        assert_eq!(engine.error(), None);
        assert!(!engine.is_loading());
    }

    #[test]
    fn test_selected_suggestion_follows_index() {
        let state = EngineState {
            suggestions: vec![item("a"), item("b")],
            selected_index: Some(1),
            ..Default::default()
        };
        assert_eq!(state.selected_suggestion().map(|s| s.id.as_str()), Some("b"));

        let state = EngineState {
            selected_index: None,
            ..state
        };
        assert!(state.selected_suggestion().is_none());
    }
}
