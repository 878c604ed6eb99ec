use std::{
    sync::{Arc, RwLock},
    time::Instant,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{activity_input::ParsedActivity, errors::AppError, storage::StorageManager};

const ACTIVITIES_FILE: &str = "activities.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,

    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_rating: Option<u8>,

    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ActivityCreate {
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

impl ActivityCreate {
    /// The clean text becomes the title; tags and priority carry over as parsed.
    pub fn from_parsed(parsed: &ParsedActivity) -> Self {
        Self {
            title: parsed.clean_text.clone(),
            tags: parsed.tags.clone(),
            priority: parsed.priority,
            focus_rating: parsed.focus_rating,
            ..Default::default()
        }
    }
}

pub trait ActivityStore: Send + Sync {
    fn create(&self, create: ActivityCreate) -> Result<Activity, AppError>;
    fn list(&self) -> Result<Vec<Activity>, AppError>;
    fn set_focus_rating(&self, id: u64, rating: u8) -> Result<Activity, AppError>;
}

/// Activity log kept as a single JSON document.
#[derive(Clone)]
pub struct JsonActivityStore {
    list: Arc<RwLock<Vec<Activity>>>,
    storage: Arc<dyn StorageManager>,
}

impl JsonActivityStore {
    pub fn load(storage: Arc<dyn StorageManager>) -> Result<Self, AppError> {
        let now = Instant::now();

        let list = if storage.exists(ACTIVITIES_FILE) {
            let data = storage.read(ACTIVITIES_FILE)?;
            serde_json::from_slice::<Vec<Activity>>(&data)?
        } else {
            log::info!("creating new activity log");
            vec![]
        };

        log::debug!(
            "took {}ms to read {} activities",
            now.elapsed().as_micros() as f64 / 1000.0,
            list.len()
        );

        Ok(Self {
            list: Arc::new(RwLock::new(list)),
            storage,
        })
    }

    fn save(&self, list: &[Activity]) -> Result<(), AppError> {
        let data = serde_json::to_vec_pretty(list)?;
        self.storage.write(ACTIVITIES_FILE, &data)?;
        Ok(())
    }

    fn read_list(&self) -> std::sync::RwLockReadGuard<'_, Vec<Activity>> {
        self.list.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_list(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Activity>> {
        self.list.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ActivityStore for JsonActivityStore {
    fn create(&self, create: ActivityCreate) -> Result<Activity, AppError> {
        if create.title.trim().is_empty() {
            return Err(AppError::EmptyActivity);
        }

        if let Some(rating) = create.focus_rating {
            if !(1..=5).contains(&rating) {
                return Err(AppError::InvalidFocusRating(rating));
            }
        }

        let mut list = self.write_list();

        let id = list.iter().map(|a| a.id + 1).max().unwrap_or(0);

        let activity = Activity {
            id,
            title: create.title,
            tags: create.tags,
            priority: create.priority,
            focus_rating: create.focus_rating,
            started_at: create.started_at.unwrap_or_else(Utc::now),
            duration_minutes: create.duration_minutes,
        };

        // the in-memory log only changes once the file does
        let mut updated = list.clone();
        updated.push(activity.clone());
        self.save(&updated)?;
        *list = updated;

        log::info!("logged activity #{id}: {:?}", activity.title);

        Ok(activity)
    }

    fn list(&self) -> Result<Vec<Activity>, AppError> {
        Ok(self.read_list().clone())
    }

    fn set_focus_rating(&self, id: u64, rating: u8) -> Result<Activity, AppError> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::InvalidFocusRating(rating));
        }

        let mut list = self.write_list();

        let mut updated = list.clone();
        let activity = updated
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AppError::NotFound(id))?;
        activity.focus_rating = Some(rating);
        let activity = activity.clone();

        self.save(&updated)?;
        *list = updated;

        Ok(activity)
    }
}

/// Tags across the log with how often each was used, most used first.
pub fn tag_counts(activities: &[Activity]) -> Vec<(String, usize)> {
    // (key, first spelling seen, count)
    let mut counts: Vec<(String, String, usize)> = vec![];

    for tag in activities.iter().flat_map(|a| a.tags.iter()) {
        let key = tag.to_lowercase();
        match counts.iter_mut().find(|(k, _, _)| *k == key) {
            Some((_, _, count)) => *count += 1,
            None => counts.push((key, tag.clone(), 1)),
        }
    }

    let mut counts = counts
        .into_iter()
        .map(|(_, tag, count)| (tag, count))
        .collect::<Vec<_>>();

    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}
