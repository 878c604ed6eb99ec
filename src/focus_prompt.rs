use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::AppError;

#[derive(Debug, Default)]
struct PromptState {
    pending: Option<u64>,
}

/// Handle to the "how focused were you?" question asked after an activity
/// is logged. Clones share one prompt; separately constructed prompts don't.
#[derive(Debug, Clone, Default)]
pub struct FocusPrompt {
    state: Arc<Mutex<PromptState>>,
}

impl FocusPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PromptState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ask for a rating of `activity_id`. Replaces any question still open.
    pub fn request(&self, activity_id: u64) {
        let mut state = self.lock();
        if let Some(previous) = state.pending.replace(activity_id) {
            log::debug!("focus prompt for activity {previous} replaced by {activity_id}");
        }
    }

    pub fn pending(&self) -> Option<u64> {
        self.lock().pending
    }

    /// Answer the open question. Returns the rated activity and the rating.
    pub fn submit(&self, rating: u8) -> Result<(u64, u8), AppError> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::InvalidFocusRating(rating));
        }

        let mut state = self.lock();
        let activity_id = state.pending.take().ok_or(AppError::NoPendingFocusPrompt)?;

        Ok((activity_id, rating))
    }

    pub fn dismiss(&self) {
        self.lock().pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_answers_pending_request() {
        let prompt = FocusPrompt::new();
        assert_eq!(prompt.pending(), None);

        prompt.request(7);
        assert_eq!(prompt.pending(), Some(7));

        assert_eq!(prompt.submit(4).unwrap(), (7, 4));
        assert_eq!(prompt.pending(), None);
    }

    #[test]
    fn test_submit_rejects_out_of_range_rating() {
        let prompt = FocusPrompt::new();
        prompt.request(1);

        assert!(matches!(
            prompt.submit(0),
            Err(AppError::InvalidFocusRating(0))
        ));
        assert!(matches!(
            prompt.submit(6),
            Err(AppError::InvalidFocusRating(6))
        ));

        // still waiting for a valid answer
        assert_eq!(prompt.pending(), Some(1));
    }

    #[test]
    fn test_submit_without_request() {
        let prompt = FocusPrompt::new();
        assert!(matches!(
            prompt.submit(3),
            Err(AppError::NoPendingFocusPrompt)
        ));
    }

    #[test]
    fn test_dismiss() {
        let prompt = FocusPrompt::new();
        prompt.request(2);
        prompt.dismiss();
        assert_eq!(prompt.pending(), None);
    }

    #[test]
    fn test_clones_share_state() {
        let prompt = FocusPrompt::new();
        let other = prompt.clone();
        let unrelated = FocusPrompt::new();

        prompt.request(9);
        assert_eq!(other.pending(), Some(9));
        assert_eq!(unrelated.pending(), None);

        assert_eq!(other.submit(5).unwrap(), (9, 5));
        assert_eq!(prompt.pending(), None);
    }
}
