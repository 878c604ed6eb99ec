use crate::suggestions::SuggestError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("activity has no text left after removing tags and priority")]
    EmptyActivity,

    #[error("activity {0} not found")]
    NotFound(u64),

    #[error("focus rating must be between 1 and 5, got {0}")]
    InvalidFocusRating(u8),

    #[error("no focus rating is being asked for")]
    NoPendingFocusPrompt,

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("suggestions: {0}")]
    Suggest(#[from] SuggestError),

    #[error("io error: {0:?}")]
    IO(#[from] std::io::Error),

    #[error("json error: {0:?}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0:?}")]
    Yaml(#[from] serde_yml::Error),

    #[error("unexpected error: {0:?}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
