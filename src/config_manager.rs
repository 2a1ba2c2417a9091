//! File-backed configuration value with change listeners and a temporary
//! override, the runtime consumer companions are generated for: an editor
//! works on `MutableConfig`, previews through [`ConfigManager::override_with`]
//! and commits with [`ConfigManager::set`].
//!
//! The value lives in `<dir>/<id>.json`, pretty printed.

use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::path_de::{self, PathError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config {id}: i/o error on {path}: {source}")]
    Io {
        id: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config {id} has a syntax error: {source}")]
    Syntax {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "failed to load config {id}: {source}. Delete the file or invalid values to regenerate defaults."
    )]
    Decode {
        id: String,
        #[source]
        source: PathError,
    },

    #[error("failed to encode config {id}: {source}")]
    Encode {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("tried to set config {id} while overridden")]
    Overridden { id: String },

    #[error("config {id} is already overridden; only a single override is allowed")]
    AlreadyOverridden { id: String },
}

type Listener<D> = Box<dyn Fn(&D) + Send + Sync>;

struct State<D> {
    value: D,
    prepared: bool,
    overridden: bool,
}

pub struct ConfigManager<D> {
    id: String,
    path: PathBuf,
    state: Mutex<State<D>>,
    listeners: RwLock<Vec<Listener<D>>>,
}

impl<D> ConfigManager<D>
where
    D: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    pub fn new(dir: impl AsRef<Path>, id: impl Into<String>, default: D) -> Self {
        let id = id.into();
        let path = dir.as_ref().join(format!("{id}.json"));
        Self {
            id,
            path,
            state: Mutex::new(State { value: default, prepared: false, overridden: false }),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current value. The first call loads the file, or writes the default
    /// when there is none; a failure there is logged and the default kept.
    pub fn get(&self) -> D {
        if let Err(err) = self.prepare() {
            tracing::error!(config = %self.id, "{err}");
        }
        self.state.lock().value.clone()
    }

    /// Store, notify listeners, save.
    pub fn set(&self, value: D) -> Result<(), ConfigError> {
        {
            let mut state = self.state.lock();
            if state.overridden {
                tracing::error!(config = %self.id, "tried to set config while overridden");
                return Err(ConfigError::Overridden { id: self.id.clone() });
            }
            state.value = value.clone();
            state.prepared = true;
        }
        self.notify(&value);
        self.save(&value)
    }

    /// Re-read the file. The error is returned for the caller to report.
    pub fn reload(&self) -> Result<(), ConfigError> {
        self.load().inspect_err(|err| {
            tracing::error!(config = %self.id, "failed to reload config: {err}");
        })
    }

    /// Called with the new value after every load and `set`; not for overrides.
    pub fn on_change(&self, listener: impl Fn(&D) + Send + Sync + 'static) {
        self.listeners.write().push(Box::new(listener));
    }

    /// Swap in `value` until the guard drops. `set` fails meanwhile.
    pub fn override_with(&self, value: D) -> Result<OverrideGuard<'_, D>, ConfigError> {
        let mut state = self.state.lock();
        if state.overridden {
            return Err(ConfigError::AlreadyOverridden { id: self.id.clone() });
        }
        state.overridden = true;
        let previous = std::mem::replace(&mut state.value, value);
        Ok(OverrideGuard { manager: self, previous: Some(previous) })
    }

    fn prepare(&self) -> Result<(), ConfigError> {
        let value = {
            let mut state = self.state.lock();
            if state.prepared {
                return Ok(());
            }
            state.prepared = true;
            state.value.clone()
        };
        if self.path.exists() {
            self.load()
        } else {
            tracing::info!(config = %self.id, path = %self.path.display(), "writing default config");
            self.save(&value)
        }
    }

    fn load(&self) -> Result<(), ConfigError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| self.io(source))?;
        let json: serde_json::Value = serde_json::from_str(&text)
            .map_err(|source| ConfigError::Syntax { id: self.id.clone(), source })?;
        let value: D = path_de::from_value_with_path(json.clone())
            .map_err(|source| ConfigError::Decode { id: self.id.clone(), source })?;
        {
            let mut state = self.state.lock();
            state.value = value.clone();
            state.prepared = true;
        }
        tracing::debug!(config = %self.id, "loaded");
        self.notify(&value);

        // defaulted fields get written back; identical JSON is left alone
        let encoded = self.encode(&value)?;
        if encoded != json {
            self.write(&encoded)?;
        }
        Ok(())
    }

    fn save(&self, value: &D) -> Result<(), ConfigError> {
        let encoded = self.encode(value)?;
        self.write(&encoded)
    }

    fn encode(&self, value: &D) -> Result<serde_json::Value, ConfigError> {
        serde_json::to_value(value).map_err(|source| ConfigError::Encode { id: self.id.clone(), source })
    }

    fn write(&self, json: &serde_json::Value) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(json)
            .map_err(|source| ConfigError::Encode { id: self.id.clone(), source })?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| self.io(source))?;
        }
        std::fs::write(&self.path, text).map_err(|source| self.io(source))
    }

    fn notify(&self, value: &D) {
        for listener in self.listeners.read().iter() {
            listener(value);
        }
    }

    fn io(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io { id: self.id.clone(), path: self.path.clone(), source }
    }
}

/// Restores the overridden value on drop.
#[must_use = "dropping the guard ends the override immediately"]
pub struct OverrideGuard<'a, D> {
    manager: &'a ConfigManager<D>,
    previous: Option<D>,
}

impl<D> Drop for OverrideGuard<'_, D> {
    fn drop(&mut self) {
        let mut state = self.manager.state.lock();
        if let Some(previous) = self.previous.take() {
            state.value = previous;
        }
        state.overridden = false;
    }
}

// ------------------------------- Tests ------------------------------------ //
