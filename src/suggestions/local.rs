use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{
    source::SuggestionSource,
    types::{SuggestError, Suggestion, SuggestionKind},
};
use crate::activities::{Activity, ActivityStore};

/// Ranks suggestions straight out of the local activity log.
///
/// Ranking: frequency desc > most recently used > alphabetical.
pub struct LocalSuggestionSource {
    store: Arc<dyn ActivityStore>,
    limit: usize,
}

struct Tally {
    text: String,
    frequency: u64,
    last_used: DateTime<Utc>,
}

impl Tally {
    fn bump(&mut self, at: DateTime<Utc>) {
        self.frequency += 1;
        if at > self.last_used {
            self.last_used = at;
        }
    }
}

impl LocalSuggestionSource {
    pub fn new(store: Arc<dyn ActivityStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Build the ranked list for `query` from a set of activities.
    pub fn rank(activities: &[Activity], query: &str, limit: usize) -> Vec<Suggestion> {
        let query = query.trim().to_lowercase();
        let tag_only = query.starts_with('#');
        let tag_query = query.trim_start_matches('#');

        let mut titles: HashMap<String, Tally> = HashMap::new();
        let mut tags: HashMap<String, Tally> = HashMap::new();

        for activity in activities {
            if !activity.title.is_empty() {
                titles
                    .entry(activity.title.to_lowercase())
                    .and_modify(|t| t.bump(activity.started_at))
                    .or_insert_with(|| Tally {
                        text: activity.title.clone(),
                        frequency: 1,
                        last_used: activity.started_at,
                    });
            }

            for tag in &activity.tags {
                tags.entry(tag.to_lowercase())
                    .and_modify(|t| t.bump(activity.started_at))
                    .or_insert_with(|| Tally {
                        text: tag.clone(),
                        frequency: 1,
                        last_used: activity.started_at,
                    });
            }
        }

        let activity_matches = titles
            .into_iter()
            .filter(|(key, _)| !tag_only && key.contains(&query))
            .map(|(key, tally)| to_suggestion(format!("activity:{key}"), SuggestionKind::Activity, tally));

        let tag_matches = tags
            .into_iter()
            .filter(|(key, _)| key.starts_with(tag_query))
            .map(|(key, tally)| to_suggestion(format!("tag:{key}"), SuggestionKind::Tag, tally));

        let mut suggestions = activity_matches.chain(tag_matches).collect::<Vec<_>>();

        suggestions.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| b.last_used.cmp(&a.last_used))
                .then_with(|| a.text.cmp(&b.text))
        });

        suggestions.truncate(limit);
        suggestions
    }
}

fn to_suggestion(id: String, kind: SuggestionKind, tally: Tally) -> Suggestion {
    Suggestion {
        id,
        text: tally.text,
        kind,
        frequency: tally.frequency,
        last_used: Some(tally.last_used),
    }
}

#[async_trait]
impl SuggestionSource for LocalSuggestionSource {
    async fn search(&self, query: &str) -> Result<Vec<Suggestion>, SuggestError> {
        let activities = self
            .store
            .list()
            .map_err(|err| SuggestError::Server(err.to_string()))?;

        log::debug!(
            "ranking {} activities for query {query:?}",
            activities.len()
        );

        Ok(Self::rank(&activities, query, self.limit))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn activity(id: u64, title: &str, tags: &[&str], hours_ago: i64) -> Activity {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        Activity {
            id,
            title: title.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            priority: None,
            focus_rating: None,
            started_at: now - Duration::hours(hours_ago),
            duration_minutes: None,
        }
    }

    fn sample() -> Vec<Activity> {
        vec![
            activity(0, "Write report", &["work", "writing"], 30),
            activity(1, "Write report", &["work"], 5),
            activity(2, "write REPORT", &["work"], 1),
            activity(3, "Gym", &["health"], 2),
            activity(4, "Code review", &["work", "code"], 3),
            activity(5, "Code review", &["code"], 4),
        ]
    }

    #[test]
    fn test_empty_query_ranks_by_frequency() {
        let ranked = LocalSuggestionSource::rank(&sample(), "", 10);
        let texts = ranked.iter().map(|s| s.text.as_str()).collect::<Vec<_>>();

        // work tag: 4 uses, "write report": 3, code tag and code review: 2 each
        assert_eq!(texts[0], "work");
        assert_eq!(ranked[1].kind, SuggestionKind::Activity);
        assert_eq!(ranked[1].frequency, 3);
        assert_eq!(ranked.len(), 7);
    }

    #[test]
    fn test_titles_group_case_insensitively() {
        let ranked = LocalSuggestionSource::rank(&sample(), "report", 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "activity:write report");
        assert_eq!(ranked[0].frequency, 3);
        // first spelling seen is kept
        assert_eq!(ranked[0].text, "Write report");
    }

    #[test]
    fn test_tie_broken_by_recency() {
        let ranked = LocalSuggestionSource::rank(&sample(), "co", 10);
        // both used twice, most recently 3h ago; text breaks the tie
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].text, "Code review");
        assert_eq!(ranked[1].text, "code");
    }

    #[test]
    fn test_hash_query_matches_tags_only() {
        let ranked = LocalSuggestionSource::rank(&sample(), "#w", 10);
        let texts = ranked.iter().map(|s| s.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["work", "writing"]);
        assert!(ranked.iter().all(|s| s.kind == SuggestionKind::Tag));
    }

    #[test]
    fn test_limit() {
        let ranked = LocalSuggestionSource::rank(&sample(), "", 2);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_last_used_is_latest() {
        let ranked = LocalSuggestionSource::rank(&sample(), "gym", 10);
        let expected = Utc.with_ymd_and_hms(2024, 5, 10, 10, 0, 0).unwrap();
        assert_eq!(ranked[0].last_used, Some(expected));
    }

    #[test]
    fn test_tags_fold_case_like_tag_counts() {
        let activities = vec![
            activity(0, "Trip planning", &["Été"], 3),
            activity(1, "Beach", &["été"], 2),
            activity(2, "Packing", &["ÉTÉ"], 1),
        ];

        let ranked = LocalSuggestionSource::rank(&activities, "#é", 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "tag:été");
        assert_eq!(ranked[0].text, "Été");
        assert_eq!(ranked[0].frequency, 3);

        let counts = crate::activities::tag_counts(&activities);
        assert_eq!(counts, vec![("Été".to_string(), 3)]);
    }
}
