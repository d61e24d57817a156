//! Application settings.
//!
//! # Responsibility
//! - Describe how the wiki reaches its store (`data_store_type`,
//!   `connection_string`, `enable_cache`) and where it logs.
//! - Load these values from TOML files.
//!
//! # Invariants
//! - A loaded configuration always carries a non-empty connection string.

use crate::db::DataStoreType;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Error raised while reading or validating settings.
#[derive(Debug)]
pub enum SettingsError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read settings `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid settings file: {err}"),
            Self::Invalid(message) => write!(f, "invalid settings: {message}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for SettingsError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Optional `[logging]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// One of `trace|debug|info|warn|error`; build default when absent.
    pub level: Option<String>,
    /// Absolute directory for rolling log files; logging stays off when absent.
    pub dir: Option<String>,
}

/// Store and logging configuration for one wiki installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSettings {
    #[serde(default)]
    pub data_store_type: DataStoreType,
    pub connection_string: String,
    #[serde(default)]
    pub enable_cache: bool,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl ApplicationSettings {
    /// Creates settings with caching off and no logging configuration.
    pub fn new(data_store_type: DataStoreType, connection_string: impl Into<String>) -> Self {
        Self {
            data_store_type,
            connection_string: connection_string.into(),
            enable_cache: false,
            logging: LoggingSettings::default(),
        }
    }

    /// Parses settings from TOML text.
    ///
    /// # Errors
    /// - Returns `Parse` for malformed TOML or unknown data store types.
    /// - Returns `Invalid` when `connection_string` is blank.
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(text)?;
        if settings.connection_string.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "connection_string cannot be empty".to_string(),
            ));
        }
        Ok(settings)
    }

    /// Reads and parses a TOML settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
