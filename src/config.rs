use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rocket::{
    fairing::{Fairing, Info, Kind},
    tokio::sync::Mutex,
    Build, Rocket,
};
use serde::Deserialize;

use crate::{
    analysis::AnalysisSession,
    model::{seed::Seed, theme::Theme},
    state::{ElectionState, ThemeState},
    storage::{FileStore, KeyValueStore, MemoryStore},
};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    storage_dir: Option<PathBuf>,
    #[serde(default)]
    storage_read_only: bool,
    #[serde(default = "default_training_ms")]
    training_ms: u64,
    #[serde(default = "default_preview_rows")]
    preview_rows: usize,
    #[serde(default)]
    default_theme: Theme,
    #[serde(default = "default_upload_limit_kib")]
    upload_limit_kib: u64,
}

fn default_training_ms() -> u64 {
    3500
}

fn default_preview_rows() -> usize {
    10
}

fn default_upload_limit_kib() -> u64 {
    2048
}

impl Config {
    /// Directory holding one JSON file per storage key.
    /// Without one, everything lives in memory and is lost on restart.
    pub fn storage_dir(&self) -> Option<&Path> {
        self.storage_dir.as_deref()
    }

    /// Simulate storage that rejects every write.
    pub fn storage_read_only(&self) -> bool {
        self.storage_read_only
    }

    /// How long a simulated training run takes.
    pub fn training_duration(&self) -> Duration {
        Duration::from_millis(self.training_ms)
    }

    /// Rows shown in the CSV preview.
    pub fn preview_rows(&self) -> usize {
        self.preview_rows
    }

    /// Theme used when none has been stored yet.
    pub fn default_theme(&self) -> Theme {
        self.default_theme
    }

    /// Largest accepted CSV upload.
    pub fn upload_limit_kib(&self) -> u64 {
        self.upload_limit_kib
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// A fairing that opens the key-value store and places the election, theme
/// and analysis state into managed state. Must be attached after
/// [`ConfigFairing`].
///
/// A store can be supplied up front, in which case the storage settings in
/// the config are ignored.
#[derive(Default)]
pub struct StateFairing {
    store: Option<Arc<dyn KeyValueStore>>,
}

impl StateFairing {
    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store: Some(store) }
    }
}

/// Open the store described by `config`.
pub fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>, crate::storage::StoreError> {
    if config.storage_read_only() {
        warn!("Storage is read-only, changes will only be kept in memory");
        let store = MemoryStore::new();
        store.set_read_only(true);
        return Ok(Arc::new(store));
    }
    match config.storage_dir() {
        Some(dir) => {
            let store = FileStore::open(dir)?;
            info!("Using file storage in {}", dir.display());
            Ok(Arc::new(store))
        }
        None => {
            info!("No storage directory configured, using in-memory storage");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[rocket::async_trait]
impl Fairing for StateFairing {
    fn info(&self) -> Info {
        Info {
            name: "Election state",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let Some(config) = rocket.state::<Config>().cloned() else {
            error!("Election state requires the application config");
            return Err(rocket);
        };

        let store = match &self.store {
            Some(store) => store.clone(),
            None => match open_store(&config) {
                Ok(store) => store,
                Err(e) => {
                    error!("Failed to open storage: {e}");
                    return Err(rocket);
                }
            },
        };

        let election = ElectionState::load(store.clone(), Seed::demo());
        let theme = ThemeState::load(store, config.default_theme());

        rocket = rocket
            .manage(Mutex::new(election))
            .manage(Mutex::new(theme))
            .manage(Mutex::new(AnalysisSession::new()));
        Ok(rocket)
    }
}

#[cfg(test)]
mod tests {
    use rocket::figment::{providers::Serialized, Figment};

    use super::*;

    #[test]
    fn defaults_fill_missing_keys() {
        let config: Config = Figment::new().extract().unwrap();
        assert_eq!(config.storage_dir(), None);
        assert!(!config.storage_read_only());
        assert_eq!(config.training_duration(), Duration::from_millis(3500));
        assert_eq!(config.preview_rows(), 10);
        assert_eq!(config.default_theme(), Theme::Light);
    }

    #[test]
    fn overrides() {
        let config: Config = Figment::new()
            .merge(Serialized::default("training_ms", 0))
            .merge(Serialized::default("default_theme", "dark"))
            .merge(Serialized::default("storage_dir", "/tmp/voto"))
            .extract()
            .unwrap();
        assert_eq!(config.training_duration(), Duration::ZERO);
        assert_eq!(config.default_theme(), Theme::Dark);
        assert_eq!(config.storage_dir(), Some(Path::new("/tmp/voto")));
    }

    #[test]
    fn read_only_store_rejects_writes() {
        let config: Config = Figment::new()
            .merge(Serialized::default("storage_read_only", true))
            .extract()
            .unwrap();
        let store = open_store(&config).unwrap();
        assert!(store.set("theme", "dark").is_err());
    }

    #[test]
    fn file_store_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config: Config = Figment::new()
            .merge(Serialized::default("storage_dir", dir.path()))
            .extract()
            .unwrap();
        let store = open_store(&config).unwrap();
        store.set("theme", "dark").unwrap();
        assert!(dir.path().join("theme.json").exists());
    }
}
