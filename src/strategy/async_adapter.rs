//! Strategy adapter for asynchronous backends.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::StorageResult;
use crate::storage::traits::AsyncBackend;
use crate::strategy::codec::{decode_value, encode_value};
use crate::strategy::traits::{PersistenceStrategy, ReadOptions, WriteOptions};

/// Persistence strategy over an [`AsyncBackend`].
///
/// Values can only be read by awaiting [`PersistenceStrategy::get`];
/// `get_sync` always returns `None` without touching the backend.
#[derive(Debug, Clone, Default)]
pub struct AsyncStrategy<B> {
    backend: B,
}

impl<B: AsyncBackend> AsyncStrategy<B> {
    /// Wrap `backend`.
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// The wrapped backend.
    pub const fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait]
impl<B: AsyncBackend> PersistenceStrategy for AsyncStrategy<B> {
    fn supports_sync(&self) -> bool {
        false
    }

    fn get_sync<T>(&self, _options: &ReadOptions<'_, T>) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
    {
        None
    }

    async fn get<T>(&self, options: &ReadOptions<'_, T>) -> Option<T>
    where
        T: Serialize + DeserializeOwned + Send,
    {
        let raw = match self.backend.get(options.key).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(
                    key = options.key,
                    backend = self.backend.backend_name(),
                    error = %e,
                    "Read failed, treating as absent"
                );
                return None;
            }
        };
        decode_value(raw, options)
    }

    async fn set<T>(&self, options: WriteOptions<'_, T>) -> StorageResult<T>
    where
        T: Serialize + Send,
    {
        let raw = encode_value(&options.value, options.serialize)?;
        self.backend.set(options.key, &raw).await?;
        Ok(options.value)
    }

    async fn clear(&self, key: &str) -> StorageResult<()> {
        self.backend.clear(key).await
    }

    fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }
}
