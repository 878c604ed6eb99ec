use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    errors::AppError,
    storage::{self, StorageManager},
    suggestions::EngineConfig,
};

const CONFIG_FILE: &str = "config.yaml";

const DEFAULT_DEBOUNCE_MS: u64 = 150;
const DEFAULT_MIN_QUERY_LENGTH: usize = 2;
const DEFAULT_SUGGESTION_LIMIT: usize = 10;
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 10;

/// Tuning for the suggestion engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuggestionsConfig {
    /// Quiet time after the last keystroke before a query is sent
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Shorter non-empty queries are not searched at all
    #[serde(default = "default_min_query_length")]
    pub min_query_length: usize,

    /// Maximum number of suggestions requested
    #[serde(default = "default_suggestion_limit")]
    pub limit: usize,
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            min_query_length: DEFAULT_MIN_QUERY_LENGTH,
            limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }
}

impl SuggestionsConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            min_query_length: self.min_query_length,
        }
    }
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_min_query_length() -> usize {
    DEFAULT_MIN_QUERY_LENGTH
}

fn default_suggestion_limit() -> usize {
    DEFAULT_SUGGESTION_LIMIT
}

/// Where the suggestion search API lives, if anywhere
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,

    #[serde(default = "default_remote_timeout_secs")]
    pub timeout_secs: u64,

    /// `user` or `user:password`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            addr: None,
            timeout_secs: DEFAULT_REMOTE_TIMEOUT_SECS,
            basic_auth: None,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn basic_auth(&self) -> Option<(String, Option<String>)> {
        parse_basic_auth(self.basic_auth.as_deref()?)
    }
}

fn default_remote_timeout_secs() -> u64 {
    DEFAULT_REMOTE_TIMEOUT_SECS
}

pub fn parse_basic_auth(value: &str) -> Option<(String, Option<String>)> {
    match value.split_once(':') {
        Some((username, password)) => Some((username.to_string(), Some(password.to_string()))),
        None if value.is_empty() => None,
        None => Some((value.to_string(), None)),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub suggestions: SuggestionsConfig,
    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: String,
}

impl Config {
    fn validate(&self) -> Result<(), AppError> {
        if self.suggestions.limit == 0 {
            return Err(AppError::config("suggestions.limit must be greater than 0"));
        }

        if self.remote.timeout_secs == 0 {
            return Err(AppError::config("remote.timeout_secs must be greater than 0"));
        }

        if let Some(addr) = &self.remote.addr {
            if let Err(err) = url::Url::parse(addr) {
                return Err(AppError::config(format!(
                    "remote.addr {addr:?} is not a valid url: {err}"
                )));
            }
        }

        Ok(())
    }

    pub fn load_with(base_path: &str) -> Result<Self, AppError> {
        let store = storage::BackendLocal::new(base_path)?;

        // create new if does not exist
        if !store.exists(CONFIG_FILE) {
            store.write(
                CONFIG_FILE,
                serde_yml::to_string(&Self::default())?.as_bytes(),
            )?;
        }

        let config_str = String::from_utf8(store.read(CONFIG_FILE)?)
            .map_err(|_| AppError::config("config file is not valid utf8"))?;
        let mut config: Self = serde_yml::from_str(&config_str)?;

        config.base_path = base_path.to_string();

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<(), AppError> {
        let store = storage::BackendLocal::new(&self.base_path)?;

        let config_str = serde_yml::to_string(&self)?;
        store.write(CONFIG_FILE, config_str.as_bytes())?;
        Ok(())
    }
}
