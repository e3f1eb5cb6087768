//! Store configuration and backend composition.
//!
//! # Responsibility
//! - Load `StoreConfig` from an optional JSON file plus `ATTENDANCE_*`
//!   environment overrides.
//! - Build the configured persistence adapter (`open_adapter`).
//!
//! # Invariants
//! - Values are trimmed and lowercased before interpretation.
//! - File-backed backends require `data_path`; `memory` ignores it.

use crate::logging::{default_log_level, normalize_level};
use crate::persistence::{
    JsonFileAdapter, MemoryAdapter, PersistenceAdapter, PersistenceError, SqliteAdapter,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_BACKEND: &str = "ATTENDANCE_BACKEND";
pub const ENV_DATA_PATH: &str = "ATTENDANCE_DATA_PATH";
pub const ENV_SEED: &str = "ATTENDANCE_SEED";
pub const ENV_LOG_LEVEL: &str = "ATTENDANCE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ATTENDANCE_LOG_DIR";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Memory,
    Json,
    Sqlite,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::InvalidValue {
                field: "backend",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub backend: BackendKind,
    /// Directory for `json`, database file for `sqlite`.
    pub data_path: Option<PathBuf>,
    /// Seed the demo dataset when the backend is empty.
    pub seed_demo_data: bool,
    pub log_level: String,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            data_path: None,
            seed_demo_data: true,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, message: String },
    Parse(String),
    InvalidValue { field: &'static str, value: String },
    MissingDataPath(BackendKind),
    Persistence(PersistenceError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "cannot read config `{}`: {message}", path.display())
            }
            Self::Parse(message) => write!(f, "invalid config document: {message}"),
            Self::InvalidValue { field, value } => write!(f, "invalid {field} `{value}`"),
            Self::MissingDataPath(backend) => {
                write!(f, "backend {backend:?} requires a data_path")
            }
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PersistenceError> for ConfigError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

impl StoreConfig {
    /// Reads a JSON config document. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.normalized()
    }

    /// Defaults or `file`, then overrides from the process environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match file {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `ATTENDANCE_*` overrides read through `lookup`.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(ENV_BACKEND) {
            self.backend = value.parse()?;
        }
        if let Some(value) = lookup(ENV_DATA_PATH) {
            self.data_path = non_blank_path(&value);
        }
        if let Some(value) = lookup(ENV_SEED) {
            self.seed_demo_data = parse_flag(&value)?;
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        if let Some(value) = lookup(ENV_LOG_DIR) {
            self.log_dir = non_blank_path(&value);
        }
        self.normalized()
    }

    fn normalized(mut self) -> Result<Self, ConfigError> {
        self.log_level = normalize_level(&self.log_level)
            .map_err(|_| ConfigError::InvalidValue {
                field: "log_level",
                value: self.log_level.clone(),
            })?
            .to_string();
        if self.backend != BackendKind::Memory && self.data_path.is_none() {
            return Err(ConfigError::MissingDataPath(self.backend));
        }
        Ok(self)
    }
}

/// Builds the adapter selected by `config`.
pub fn open_adapter(config: &StoreConfig) -> Result<Box<dyn PersistenceAdapter>, ConfigError> {
    let adapter: Box<dyn PersistenceAdapter> = match config.backend {
        BackendKind::Memory => Box::new(MemoryAdapter::new()),
        BackendKind::Json => Box::new(JsonFileAdapter::open(required_path(config)?)?),
        BackendKind::Sqlite => Box::new(SqliteAdapter::open(required_path(config)?)?),
    };
    info!(
        "event=adapter_open module=config status=ok backend={}",
        adapter.backend_name()
    );
    Ok(adapter)
}

fn required_path(config: &StoreConfig) -> Result<&Path, ConfigError> {
    config
        .data_path
        .as_deref()
        .ok_or(ConfigError::MissingDataPath(config.backend))
}

fn non_blank_path(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

fn parse_flag(value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field: "seed",
            value: other.to_string(),
        }),
    }
}
