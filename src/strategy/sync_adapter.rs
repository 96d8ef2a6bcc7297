//! Strategy adapter for synchronous backends.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::StorageResult;
use crate::storage::traits::SyncBackend;
use crate::strategy::codec::{decode_value, encode_value};
use crate::strategy::traits::{PersistenceStrategy, ReadOptions, WriteOptions};

/// Persistence strategy over a [`SyncBackend`].
///
/// Supports `get_sync`; the asynchronous `get` runs the same read and
/// resolves immediately.
#[derive(Debug, Clone, Default)]
pub struct SyncStrategy<B> {
    backend: B,
}

impl<B: SyncBackend> SyncStrategy<B> {
    /// Wrap `backend`.
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// The wrapped backend.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    fn read<T>(&self, options: &ReadOptions<'_, T>) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let raw = match self.backend.get(options.key) {
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
}

#[async_trait]
impl<B: SyncBackend> PersistenceStrategy for SyncStrategy<B> {
    fn supports_sync(&self) -> bool {
        true
    }

    fn get_sync<T>(&self, options: &ReadOptions<'_, T>) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
    {
        self.read(options)
    }

    async fn get<T>(&self, options: &ReadOptions<'_, T>) -> Option<T>
    where
        T: Serialize + DeserializeOwned + Send,
    {
        self.read(options)
    }

    async fn set<T>(&self, options: WriteOptions<'_, T>) -> StorageResult<T>
    where
        T: Serialize + Send,
    {
        let raw = encode_value(&options.value, options.serialize)?;
        self.backend.set(options.key, &raw)?;
        Ok(options.value)
    }

    async fn clear(&self, key: &str) -> StorageResult<()> {
        self.backend.clear(key)
    }

    fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn accept_all(_: &u32) -> bool {
        true
    }

    fn read_options(key: &str) -> ReadOptions<'_, u32> {
        ReadOptions {
            key,
            validate: &accept_all,
            deserialize: None,
        }
    }

    #[tokio::test]
    async fn test_set_then_get_sync() {
        let strategy = SyncStrategy::new(MemoryStore::new());
        assert!(strategy.supports_sync());

        let written = strategy
            .set(WriteOptions {
                key: "clicks",
                value: 3_u32,
                serialize: None,
            })
            .await
            .unwrap();
        assert_eq!(written, 3);

        assert_eq!(strategy.get_sync(&read_options("clicks")), Some(3));
        assert_eq!(strategy.get(&read_options("clicks")).await, Some(3));
        assert_eq!(strategy.backend().get("clicks").unwrap().as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_clear_twice() {
        let strategy = SyncStrategy::new(MemoryStore::new());
        strategy.backend().set("clicks", "1").unwrap();

        strategy.clear("clicks").await.unwrap();
        strategy.clear("clicks").await.unwrap();
        assert_eq!(strategy.get_sync(&read_options("clicks")), None);
    }

    #[tokio::test]
    async fn test_invalid_stored_value_is_absent() {
        let strategy = SyncStrategy::new(MemoryStore::new());
        strategy.backend().set("clicks", "\"many\"").unwrap();

        assert_eq!(strategy.get_sync(&read_options("clicks")), None);
        assert_eq!(strategy.get(&read_options("clicks")).await, None);
    }
}
