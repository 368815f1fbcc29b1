//! Configuration
//!
//! Settings are read from TOML, optionally overridden by `DYNAFORM_*`
//! environment variables, and handed explicitly to the adapters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "DYNAFORM_";

/// Keys accepted by [`DynaformConfig::get`] and [`DynaformConfig::set`]
pub const KEYS: &[&str] = &[
    "backend",
    "collection",
    "poll_interval_secs",
    "local_path",
    "firestore.project_id",
    "firestore.api_key",
    "firestore.database",
    "firestore.base_url",
];

/// Document store selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local, lost on exit
    Memory,
    /// JSON snapshot file
    #[default]
    Local,
    Firestore,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Local => "local",
            Self::Firestore => "firestore",
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "local" => Ok(Self::Local),
            "firestore" => Ok(Self::Firestore),
            other => Err(format!("unknown backend '{}' (expected memory, local or firestore)", other)),
        }
    }
}

/// Cloud Firestore connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirestoreConfig {
    pub project_id: String,
    /// Web API key, sent as the `key` query parameter
    pub api_key: Option<String>,
    pub database: String,
    pub base_url: String,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            api_key: None,
            database: "(default)".into(),
            base_url: "https://firestore.googleapis.com/v1".into(),
        }
    }
}

/// Dynaform configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynaformConfig {
    pub backend: StoreBackend,
    /// Collection holding schema revisions
    pub collection: String,
    pub poll_interval_secs: u64,
    /// Snapshot file of the local backend
    pub local_path: Option<PathBuf>,
    pub firestore: FirestoreConfig,
}

impl Default for DynaformConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            collection: crate::FORMS_COLLECTION.into(),
            poll_interval_secs: 3,
            local_path: None,
            firestore: FirestoreConfig::default(),
        }
    }
}

impl DynaformConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io { path: path.to_path_buf(), source: e }),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Write as TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Io { path: parent.to_path_buf(), source: e })?;
        }
        std::fs::write(path, self.to_toml_string()?)
            .map_err(|e| ConfigError::Io { path: path.to_path_buf(), source: e })
    }

    /// Apply `DYNAFORM_*` overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(std::env::vars())
    }

    /// Apply overrides given as environment-style pairs.
    /// `DYNAFORM_FIRESTORE_PROJECT_ID` sets `firestore.project_id`.
    pub fn with_overrides<I>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let Some(key) = env_key(&name) else { continue };
            tracing::debug!(key = %key, "Applying environment override");
            self.set(key, &value)?;
        }
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let value = match key {
            "backend" => Some(self.backend.to_string()),
            "collection" => Some(self.collection.clone()),
            "poll_interval_secs" => Some(self.poll_interval_secs.to_string()),
            "local_path" => self.local_path.as_ref().map(|p| p.display().to_string()),
            "firestore.project_id" => Some(self.firestore.project_id.clone()),
            "firestore.api_key" => self.firestore.api_key.clone(),
            "firestore.database" => Some(self.firestore.database.clone()),
            "firestore.base_url" => Some(self.firestore.base_url.clone()),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        };
        Ok(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason,
        };

        match key {
            "backend" => self.backend = value.parse().map_err(invalid)?,
            "collection" => self.collection = value.to_string(),
            "poll_interval_secs" => {
                self.poll_interval_secs = value.parse().map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?
            }
            "local_path" => self.local_path = non_empty(value).map(PathBuf::from),
            "firestore.project_id" => self.firestore.project_id = value.to_string(),
            "firestore.api_key" => self.firestore.api_key = non_empty(value).map(str::to_string),
            "firestore.database" => self.firestore.database = value.to_string(),
            "firestore.base_url" => self.firestore.base_url = value.trim_end_matches('/').to_string(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Check the settings needed by the selected backend
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection.trim().is_empty() {
            return Err(ConfigError::Missing("collection"));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "poll_interval_secs".into(),
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.backend == StoreBackend::Firestore {
            if self.firestore.project_id.trim().is_empty() {
                return Err(ConfigError::Missing("firestore.project_id"));
            }
            if self.firestore.database.trim().is_empty() {
                return Err(ConfigError::Missing("firestore.database"));
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// `DYNAFORM_FIRESTORE_API_KEY` -> `firestore.api_key`
fn env_key(name: &str) -> Option<&'static str> {
    let suffix = name.strip_prefix(ENV_PREFIX)?.to_lowercase();
    KEYS.iter()
        .copied()
        .find(|key| key.replace('.', "_") == suffix)
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.trim().is_empty()).then_some(value)
}

/// Configuration error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot access {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("invalid configuration file: {0}")]
    Parse(String),

    #[error("cannot serialize configuration: {0}")]
    Serialize(String),

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue { key: String, value: String, reason: String },

    #[error("{0} must be set")]
    Missing(&'static str),
}
