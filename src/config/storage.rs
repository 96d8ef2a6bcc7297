//! Storage configuration.

use std::path::PathBuf;

use config::ConfigError;
use serde::Deserialize;

/// Where a strategy keeps its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyScope {
    /// In-memory, lives as long as the process.
    Session,
    /// File-backed, survives restarts.
    #[default]
    Local,
    /// Remote key/value service over HTTP.
    Remote,
}

impl std::fmt::Display for StrategyScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session => write!(f, "session"),
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Default scope used when none is requested explicitly.
    #[serde(default)]
    pub scope: StrategyScope,

    /// File store configuration (local scope).
    #[serde(default)]
    pub file: FileStoreConfig,

    /// Remote store configuration (remote scope).
    #[serde(default)]
    pub remote: RemoteStoreConfig,
}

impl StorageConfig {
    /// Validate the storage configuration for the given scope.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration fields are missing for the scope.
    pub fn validate_scope(&self, scope: StrategyScope) -> Result<(), ConfigError> {
        match scope {
            StrategyScope::Session => Ok(()),
            StrategyScope::Local => {
                if self.file.file_name.trim().is_empty() {
                    return Err(ConfigError::Message(
                        "storage.file.file_name cannot be empty".to_string(),
                    ));
                }
                Ok(())
            }
            StrategyScope::Remote => {
                if self.remote.base_url.is_empty() {
                    return Err(ConfigError::Message(
                        "storage.remote.base_url cannot be empty".to_string(),
                    ));
                }
                url::Url::parse(&self.remote.base_url).map_err(|e| {
                    ConfigError::Message(format!("storage.remote.base_url is invalid: {e}"))
                })?;
                Ok(())
            }
        }
    }

    /// Validate the storage configuration for the default scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the default scope is misconfigured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_scope(self.scope)
    }
}

/// File store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FileStoreConfig {
    /// Directory holding the store file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Name of the JSON document inside `data_dir`.
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_file_name() -> String {
    "local-storage.json".to_string()
}

impl FileStoreConfig {
    /// Full path of the store file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            file_name: default_file_name(),
        }
    }
}

/// Remote key/value service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteStoreConfig {
    /// Service endpoint; the `key` query parameter is appended per request.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:4000/".to_string()
}

const fn default_timeout_secs() -> u64 {
    5
}

impl Default for RemoteStoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
