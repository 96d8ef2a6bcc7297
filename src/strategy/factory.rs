//! Strategy factory.
//!
//! Creates the strategy for a configured scope, and [`Strategy`], the
//! runtime-selected strategy that persistent items default to.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::{StorageConfig, StrategyScope};
use crate::error::{AppError, StorageResult};
use crate::storage::{FileStore, MemoryStore, RemoteStore};
use crate::strategy::async_adapter::AsyncStrategy;
use crate::strategy::sync_adapter::SyncStrategy;
use crate::strategy::traits::{PersistenceStrategy, ReadOptions, WriteOptions};

/// A strategy chosen at runtime from the available scopes.
#[derive(Debug)]
pub enum Strategy {
    /// In-memory, process-lifetime values.
    Session(SyncStrategy<MemoryStore>),
    /// File-backed values.
    Local(SyncStrategy<FileStore>),
    /// Values held by the remote key/value service.
    Remote(AsyncStrategy<RemoteStore>),
}

impl Strategy {
    /// Scope this strategy was built for.
    #[must_use]
    pub const fn scope(&self) -> StrategyScope {
        match self {
            Self::Session(_) => StrategyScope::Session,
            Self::Local(_) => StrategyScope::Local,
            Self::Remote(_) => StrategyScope::Remote,
        }
    }
}

#[async_trait]
impl PersistenceStrategy for Strategy {
    fn supports_sync(&self) -> bool {
        match self {
            Self::Session(s) => s.supports_sync(),
            Self::Local(s) => s.supports_sync(),
            Self::Remote(s) => s.supports_sync(),
        }
    }

    fn get_sync<T>(&self, options: &ReadOptions<'_, T>) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
    {
        match self {
            Self::Session(s) => s.get_sync(options),
            Self::Local(s) => s.get_sync(options),
            Self::Remote(s) => s.get_sync(options),
        }
    }

    async fn get<T>(&self, options: &ReadOptions<'_, T>) -> Option<T>
    where
        T: Serialize + DeserializeOwned + Send,
    {
        match self {
            Self::Session(s) => s.get(options).await,
            Self::Local(s) => s.get(options).await,
            Self::Remote(s) => s.get(options).await,
        }
    }

    async fn set<T>(&self, options: WriteOptions<'_, T>) -> StorageResult<T>
    where
        T: Serialize + Send,
    {
        match self {
            Self::Session(s) => s.set(options).await,
            Self::Local(s) => s.set(options).await,
            Self::Remote(s) => s.set(options).await,
        }
    }

    async fn clear(&self, key: &str) -> StorageResult<()> {
        match self {
            Self::Session(s) => s.clear(key).await,
            Self::Local(s) => s.clear(key).await,
            Self::Remote(s) => s.clear(key).await,
        }
    }

    fn backend_name(&self) -> &'static str {
        match self {
            Self::Session(s) => s.backend_name(),
            Self::Local(s) => s.backend_name(),
            Self::Remote(s) => s.backend_name(),
        }
    }
}

/// Create a strategy for `scope`.
///
/// # Arguments
///
/// * `scope` - Which backend the strategy sits on
/// * `config` - Storage configuration
///
/// # Errors
///
/// Returns an error if the scope is misconfigured or its backend cannot be initialized.
pub fn create_strategy(scope: StrategyScope, config: &StorageConfig) -> Result<Strategy, AppError> {
    config.validate_scope(scope)?;

    match scope {
        StrategyScope::Session => Ok(Strategy::Session(SyncStrategy::new(MemoryStore::new()))),
        StrategyScope::Local => {
            let store = FileStore::new(&config.file)?;
            Ok(Strategy::Local(SyncStrategy::new(store)))
        }
        StrategyScope::Remote => {
            let store = RemoteStore::new(&config.remote)?;
            Ok(Strategy::Remote(AsyncStrategy::new(store)))
        }
    }
}

/// Create a strategy for the configured default scope.
///
/// # Errors
///
/// Returns an error if the default scope cannot be built.
pub fn create_default_strategy(config: &StorageConfig) -> Result<Strategy, AppError> {
    create_strategy(config.scope, config)
}
