//! Application configuration file.
//!
//! # Responsibility
//! - Load connection settings and optional logging settings from JSON.
//! - Resolve the config path from `CATEQUESIS_CONFIG` or `config.json`.
//!
//! # Invariants
//! - `sql_server.database` is non-empty after loading.
//! - The password never appears in `Debug` output.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "CATEQUESIS_CONFIG";
/// Config file looked up in the working directory by default.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// Parameters handed to the connection provider.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct ConnectionSettings {
    #[serde(rename = "name_server", alias = "server_name", default)]
    pub server_name: String,
    pub database: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl Debug for ConnectionSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("server_name", &self.server_name)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Optional logging section. Missing values fall back to build defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub sql_server: ConnectionSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Parses and checks a JSON config document.
    pub fn from_json(path: &Path, text: &str) -> ConfigResult<Self> {
        let config: AppConfig =
            serde_json::from_str(text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> ConfigResult<()> {
        if self.sql_server.database.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "sql_server.database cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reads the config file at `path`.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<AppConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    AppConfig::from_json(path, &text)
}

/// Config location: `$CATEQUESIS_CONFIG` when set and non-empty, else `config.json`.
pub fn config_path() -> PathBuf {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value.trim()),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}
