//! Application state for Axum handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::{AppConfig, StrategyScope};
use crate::error::AppError;
use crate::storage::{FileStore, MemoryStore, SyncBackend};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Store holding the served values.
    pub store: Arc<dyn SyncBackend>,
    /// Prometheus handle, when metrics are enabled.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn SyncBackend>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            config,
            store,
            metrics,
        }
    }

    /// Create the state with the store selected by `server.backing`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be initialized, or if the
    /// configured backing is the remote scope.
    pub fn from_config(
        config: Arc<AppConfig>,
        metrics: Option<PrometheusHandle>,
    ) -> Result<Self, AppError> {
        let store: Arc<dyn SyncBackend> = match config.server.backing {
            StrategyScope::Session => Arc::new(MemoryStore::new()),
            StrategyScope::Local => Arc::new(FileStore::new(&config.storage.file)?),
            StrategyScope::Remote => {
                return Err(AppError::UnsupportedScope(
                    "the key/value service cannot be backed by itself".to_string(),
                ));
            }
        };

        Ok(Self::new(config, store, metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_config_backings() {
        let state = AppState::from_config(Arc::new(AppConfig::default()), None).unwrap();
        assert_eq!(state.store.backend_name(), "memory");

        let temp_dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.server.backing = StrategyScope::Local;
        config.storage.file.data_dir = temp_dir.path().to_path_buf();
        let state = AppState::from_config(Arc::new(config), None).unwrap();
        assert_eq!(state.store.backend_name(), "file");

        let mut config = AppConfig::default();
        config.server.backing = StrategyScope::Remote;
        assert!(matches!(
            AppState::from_config(Arc::new(config), None),
            Err(AppError::UnsupportedScope(_))
        ));
    }
}
