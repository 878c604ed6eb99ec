use crate::{
    activities::{ActivityStore, JsonActivityStore},
    config::{self, Config},
    storage,
    suggestions::{LocalSuggestionSource, RemoteSuggestionSource, SuggestionSource},
};
use anyhow::{Context, Result};
use homedir::my_home;
use std::sync::Arc;

/// Where everything lives on disk
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub base_path: String,
}

/// Application factory for creating and configuring application components
pub struct AppFactory;

impl AppFactory {
    /// Get application paths, creating the base directory if needed
    pub fn get_paths() -> Result<AppPaths> {
        let base_path = Self::get_base_path()?;

        std::fs::create_dir_all(&base_path)
            .context("Failed to create application base directory")?;

        Ok(AppPaths { base_path })
    }

    fn get_base_path() -> Result<String> {
        if let Ok(base_path) = std::env::var("TEMPO_BASE_PATH") {
            return Ok(base_path);
        }

        let home = my_home()
            .context("Could not determine home directory")?
            .context("Home directory path is empty")?;

        Ok(format!("{}/.local/share/tempo", home.to_string_lossy()))
    }

    pub fn create_config(paths: &AppPaths) -> Result<Config> {
        Config::load_with(&paths.base_path).context("Failed to load config")
    }

    pub fn create_activity_store(paths: &AppPaths) -> Result<Arc<dyn ActivityStore>> {
        let storage_mgr = storage::BackendLocal::new(&paths.base_path)?;
        let store = JsonActivityStore::load(Arc::new(storage_mgr))?;
        Ok(Arc::new(store))
    }

    /// Pick the suggestion source: an explicit address wins, then `TEMPO_ADDR`,
    /// then `remote.addr` from the config. Without any, suggestions come from
    /// the local activity log.
    pub fn create_source(
        remote: Option<String>,
        config: &Config,
        store: Arc<dyn ActivityStore>,
    ) -> Result<Arc<dyn SuggestionSource>> {
        let limit = config.suggestions.limit;

        let addr = remote
            .or_else(|| std::env::var("TEMPO_ADDR").ok())
            .or_else(|| config.remote.addr.clone());

        let Some(addr) = addr else {
            log::debug!("using local suggestions");
            return Ok(Arc::new(LocalSuggestionSource::new(store, limit)));
        };

        log::info!("Using remote suggestions: {}", addr);

        let basic_auth = match std::env::var("TEMPO_BASIC_AUTH") {
            Ok(value) => {
                let parsed = config::parse_basic_auth(&value);
                if parsed.is_none() {
                    log::warn!(
                        "Invalid TEMPO_BASIC_AUTH format. Expected 'username' or 'username:password'"
                    );
                }
                parsed
            }
            Err(_) => config.remote.basic_auth(),
        };

        let source =
            RemoteSuggestionSource::new(&addr, basic_auth, limit, config.remote.timeout())?;

        Ok(Arc::new(source))
    }
}
