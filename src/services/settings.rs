//! Persistent key-value settings
//!
//! The daemon only persists the configured session length, stored in whole
//! minutes under [`CONFIGURED_MINUTES_KEY`]. Everything else lives in memory
//! and is lost on restart.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::state::machine::DEFAULT_MINUTES;

pub const CONFIGURED_MINUTES_KEY: &str = "configuredMinutes";

/// Settings store errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {path} is not a JSON object: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Settings lock poisoned")]
    Poisoned,
}

/// Minimal get/set contract the timer relies on
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError>;
    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError>;
}

/// Settings kept in a single JSON object on disk
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    cache: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open the store, reading the file if it exists.
    /// A missing file is an empty store; it is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let cache = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => Map::new(),
            Ok(contents) => serde_json::from_str::<Map<String, Value>>(&contents).map_err(
                |source| SettingsError::Parse {
                    path: path.clone(),
                    source,
                },
            )?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}, starting empty", path.display());
                Map::new()
            }
            Err(source) => return Err(SettingsError::Read { path, source }),
        };

        Ok(Self {
            path,
            cache: Mutex::new(cache),
        })
    }

    /// Default location: `<config dir>/pomodoro-keeper/settings.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pomodoro-keeper")
            .join("settings.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, contents: &Map<String, Value>) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: self.path.clone(),
                source,
            })?;
        }

        let serialized = serde_json::to_string_pretty(contents).map_err(|source| {
            SettingsError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;

        // Replaced via rename, readers never see a partial file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serialized).map_err(|source| SettingsError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| SettingsError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        let cache = self.cache.lock().map_err(|_| SettingsError::Poisoned)?;
        Ok(cache.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut cache = self.cache.lock().map_err(|_| SettingsError::Poisoned)?;
        cache.insert(key.to_string(), value);
        self.flush(&cache)
    }
}

/// Settings that only live as long as the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        let values = self.values.lock().map_err(|_| SettingsError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut values = self.values.lock().map_err(|_| SettingsError::Poisoned)?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Read the persisted session length, falling back to the default when the
/// value is absent, unreadable, or not a positive whole number
pub fn load_configured_minutes(store: &dyn SettingsStore) -> u64 {
    match store.get(CONFIGURED_MINUTES_KEY) {
        Ok(Some(value)) => match value.as_u64().filter(|m| *m > 0) {
            Some(minutes) => {
                info!("Loaded configured session length: {} min", minutes);
                minutes
            }
            None => {
                warn!(
                    "Ignoring invalid {} value {}, using {} min",
                    CONFIGURED_MINUTES_KEY, value, DEFAULT_MINUTES
                );
                DEFAULT_MINUTES
            }
        },
        Ok(None) => DEFAULT_MINUTES,
        Err(e) => {
            warn!("Failed to read settings, using {} min: {}", DEFAULT_MINUTES, e);
            DEFAULT_MINUTES
        }
    }
}

/// Persist the session length in whole minutes
pub fn save_configured_minutes(
    store: &dyn SettingsStore,
    minutes: u64,
) -> Result<(), SettingsError> {
    store.set(CONFIGURED_MINUTES_KEY, Value::from(minutes))
}
