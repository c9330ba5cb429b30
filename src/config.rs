use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const CONFIG_FILE_NAME: &str = ".trans.yaml";
const CONFIG_PATH_VAR: &str = "TRANS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not resolve the home directory")]
    HomeDir,

    #[error("failed to access config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Provider settings persisted in `~/.trans.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Config {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    BaseUrl,
    ApiKey,
    Model,
}

impl ConfigKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BaseUrl => "base_url",
            Self::ApiKey => "api_key",
            Self::Model => "model",
        }
    }
}

/// The config file on disk together with the values loaded from it.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    /// Reads the config file at `path`.
    ///
    /// A missing or empty file yields the defaults. Fields absent from the
    /// file keep their default values.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::new(path, Config::default()));
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        if content.trim().is_empty() {
            return Ok(Self::new(path, Config::default()));
        }

        match serde_yaml::from_str::<Config>(&content) {
            Ok(config) => {
                debug!(path = %path.display(), "loaded config file");
                Ok(Self::new(path, config))
            }
            Err(source) => Err(ConfigError::Parse { path, source }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sets one field and rewrites the whole file.
    pub fn save(&mut self, key: ConfigKey, value: &str) -> Result<(), ConfigError> {
        let mut updated = self.config.clone();
        match key {
            ConfigKey::BaseUrl => updated.base_url = value.to_string(),
            ConfigKey::ApiKey => updated.api_key = value.to_string(),
            ConfigKey::Model => updated.model = value.to_string(),
        }

        let serialized = serde_yaml::to_string(&updated)?;
        self.create_parent_dir()?;
        fs::write(&self.path, serialized).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;

        self.config = updated;
        info!(key = key.as_str(), path = %self.path.display(), "saved config value");
        Ok(())
    }

    /// Creates an empty config file if none exists yet.
    pub fn ensure_file_exists(&self) -> Result<(), ConfigError> {
        self.create_parent_dir()?;
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(_) => {
                debug!(path = %self.path.display(), "created empty config file");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(source) => Err(ConfigError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn create_parent_dir(&self) -> Result<(), ConfigError> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
            _ => Ok(()),
        }
    }
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    resolve_config_path(|key| env::var(key).ok(), dirs::home_dir())
}

fn resolve_config_path(
    mut get_var: impl FnMut(&str) -> Option<String>,
    home: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = get_var(CONFIG_PATH_VAR)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    {
        return Ok(PathBuf::from(path));
    }

    home.map(|dir| dir.join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::HomeDir)
}
