//! Application configuration, loaded once at startup from TOML.
//!
//! Every field has a default, so a missing file or a partial file is valid.
//! The config is passed by reference into collaborators; the engine itself
//! takes no configuration.

use std::path::{Path, PathBuf};

use pricecast_core::forecast::Horizon;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pricecast.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding `<SYMBOL>.csv` price files.
    pub data_dir: PathBuf,
    /// Directory for the daily JSON journal.
    pub reports_dir: PathBuf,
    /// Directory for exported reports.
    pub export_dir: PathBuf,
    pub export_format: ExportFormat,
    #[serde(rename = "horizon_days")]
    pub horizon: Horizon,
    pub advice: AdviceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            reports_dir: PathBuf::from("reports"),
            export_dir: PathBuf::from("exports"),
            export_format: ExportFormat::Json,
            horizon: Horizon::default(),
            advice: AdviceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, or from `pricecast.toml` when it exists.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.advice.mode == AdviceMode::Http && self.advice.endpoint.is_none() {
            return Err(ConfigError::Invalid(
                "advice.mode = \"http\" requires advice.endpoint".into(),
            ));
        }
        if self.advice.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "advice.timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Deterministic BLAKE3 fingerprint of the effective configuration.
    ///
    /// Two runs with identical configs share the same fingerprint; it is
    /// recorded in exports so a report can be traced to its settings.
    pub fn fingerprint(&self) -> String {
        // Serializing plain strings, paths and numbers cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

/// Output format for exported reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ConfigError::Invalid(format!(
                "unknown export format '{other}' (expected json or csv)"
            ))),
        }
    }
}

/// Which advice generator to use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdviceMode {
    #[default]
    RuleBased,
    Http,
    Disabled,
}

/// Advice generator settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdviceConfig {
    pub mode: AdviceMode,
    /// URL the HTTP advisor posts the analysis to.
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            mode: AdviceMode::RuleBased,
            endpoint: None,
            api_key_env: "PRICECAST_ADVICE_API_KEY".into(),
            timeout_secs: 30,
        }
    }
}
