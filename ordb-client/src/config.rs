//! Driver configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via ORDB_CONFIG)
//! 3. Environment variables

use ordb_protocol::command::{DEFAULT_FETCH_PLAN, DEFAULT_SCRIPT_LANGUAGE, NO_LIMIT};
use ordb_protocol::rid::CLUSTER_ID_INVALID;
use ordb_protocol::OperationMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Driver configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Defaults applied to commands.
    pub command: CommandConfig,
    /// Transaction settings.
    pub transaction: TransactionConfig,
}

impl DriverConfig {
    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("ORDB_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: DriverConfig = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        tracing::debug!(path = %path.display(), "loaded driver config");
        Ok(config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Saves configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        self.command.apply_overrides(&var);
        self.transaction.apply_overrides(&var);
    }
}

/// Defaults for command requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Fetch plan sent with every command.
    pub fetch_plan: String,
    /// Limit on non-text results. -1 means no limit.
    pub non_text_limit: i32,
    /// Synchronous or asynchronous result delivery.
    pub mode: OperationMode,
    /// Language used for scripts that do not name one.
    pub script_language: String,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            fetch_plan: DEFAULT_FETCH_PLAN.to_string(),
            non_text_limit: NO_LIMIT,
            mode: OperationMode::Synchronous,
            script_language: DEFAULT_SCRIPT_LANGUAGE.to_string(),
        }
    }
}

impl CommandConfig {
    fn apply_overrides(&mut self, var: &impl Fn(&str) -> Option<String>) {
        if let Some(plan) = var("ORDB_FETCH_PLAN") {
            self.fetch_plan = plan;
        }

        if let Some(limit) = var("ORDB_NON_TEXT_LIMIT") {
            match limit.parse() {
                Ok(n) => self.non_text_limit = n,
                Err(_) => tracing::warn!(value = %limit, "ignoring invalid ORDB_NON_TEXT_LIMIT"),
            }
        }

        if let Some(mode) = var("ORDB_COMMAND_MODE") {
            match mode.parse() {
                Ok(m) => self.mode = m,
                Err(e) => tracing::warn!("ignoring ORDB_COMMAND_MODE: {}", e),
            }
        }

        if let Some(language) = var("ORDB_SCRIPT_LANGUAGE") {
            if !language.is_empty() {
                self.script_language = language;
            }
        }
    }
}

/// Transaction settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Cluster id of temporary identities assigned to new records.
    pub temp_cluster_id: i16,
    /// Whether the server should write the commit to its log.
    pub using_log: bool,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            temp_cluster_id: CLUSTER_ID_INVALID,
            using_log: true,
        }
    }
}

impl TransactionConfig {
    fn apply_overrides(&mut self, var: &impl Fn(&str) -> Option<String>) {
        if let Some(log) = var("ORDB_TX_USING_LOG") {
            self.using_log = log == "1" || log.to_lowercase() == "true";
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {1}", path = .0.display())]
    IoError(PathBuf, std::io::Error),

    #[error("failed to parse config file '{path}': {1}", path = .0.display())]
    ParseError(PathBuf, String),
}
