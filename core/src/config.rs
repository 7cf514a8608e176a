//! Client configuration.
//!
//! Layered, highest priority first:
//! 1. Explicit overrides (CLI flags, environment variables)
//! 2. TOML config file (`~/.config/tasklist/config.toml`)
//! 3. Compiled defaults

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::client::DEFAULT_TIMEOUT;
use crate::validator::ValidationRules;

/// Base URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Errors that can occur when loading client configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// A value parsed but is unusable.
    #[error("invalid configuration: {0}")]
    InvalidValue(String),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    api: ApiFileConfig,
    validation: ValidationFileConfig,
}

/// `[api]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiFileConfig {
    base_url: Option<String>,
    timeout_ms: Option<u64>,
    auth_token: Option<String>,
    headers: BTreeMap<String, String>,
}

/// `[validation]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ValidationFileConfig {
    title_min: Option<usize>,
    title_max: Option<usize>,
    description_min: Option<usize>,
    description_max: Option<usize>,
}

/// Values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub auth_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub auth_token: Option<String>,
    /// Extra headers merged over the JSON defaults.
    pub headers: Vec<(String, String)>,
    pub validation: ValidationRules,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            auth_token: None,
            headers: Vec::new(),
            validation: ValidationRules::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging overrides with a TOML file.
    ///
    /// An explicit `path` that cannot be read is an error. Without one, the
    /// default path is tried and a missing file counts as empty.
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let file = load_config_file(path)?;
        Self::resolve(&file, overrides)
    }

    /// Parse a TOML document and resolve it without overrides.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(contents)?;
        Self::resolve(&file, &ConfigOverrides::default())
    }

    /// Default config file location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tasklist").join("config.toml"))
    }

    /// Priority: overrides > file > default.
    fn resolve(file: &ConfigFile, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let rules = defaults.validation;

        let timeout_ms = overrides.timeout_ms.or(file.api.timeout_ms);
        if timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }

        let base_url = overrides
            .base_url
            .clone()
            .or_else(|| file.api.base_url.clone())
            .unwrap_or(defaults.base_url);
        if base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue("base_url must not be empty".to_string()));
        }

        let validation = ValidationRules {
            title_min: file.validation.title_min.unwrap_or(rules.title_min),
            title_max: file.validation.title_max.unwrap_or(rules.title_max),
            description_min: file
                .validation
                .description_min
                .unwrap_or(rules.description_min),
            description_max: file
                .validation
                .description_max
                .unwrap_or(rules.description_max),
        };
        if validation.title_min > validation.title_max {
            return Err(ConfigError::InvalidValue(
                "title_min exceeds title_max".to_string(),
            ));
        }
        if validation.description_min > validation.description_max {
            return Err(ConfigError::InvalidValue(
                "description_min exceeds description_max".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            timeout: timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            auth_token: overrides
                .auth_token
                .clone()
                .or_else(|| file.api.auth_token.clone()),
            headers: file
                .api
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            validation,
        })
    }
}

fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(path) = explicit_path {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(path) = ClientConfig::default_path() else {
        return Ok(ConfigFile::default());
    };
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
