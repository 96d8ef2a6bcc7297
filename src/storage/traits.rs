//! Raw backend trait definitions.
//!
//! A raw backend only moves opaque text in and out under a key. Encoding,
//! decoding and validation are layered on top by the strategy adapters in
//! [`crate::strategy`].

use async_trait::async_trait;

use crate::error::StorageResult;

/// Non-blocking key/value store.
///
/// Every operation completes before returning, which is what lets a strategy
/// built on top of it answer `get_sync`.
pub trait SyncBackend: Send + Sync {
    /// Read the raw text stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `raw` under `key`, replacing any previous value.
    fn set(&self, key: &str, raw: &str) -> StorageResult<()>;

    /// Remove the value stored under `key`. Removing an absent key is not an error.
    fn clear(&self, key: &str) -> StorageResult<()>;

    /// Get the backend name.
    fn backend_name(&self) -> &'static str;
}

/// Key/value store whose operations suspend on I/O.
#[async_trait]
pub trait AsyncBackend: Send + Sync {
    /// Read the raw text stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `raw` under `key`, replacing any previous value.
    async fn set(&self, key: &str, raw: &str) -> StorageResult<()>;

    /// Remove the value stored under `key`. Removing an absent key is not an error.
    async fn clear(&self, key: &str) -> StorageResult<()>;

    /// Get the backend name.
    fn backend_name(&self) -> &'static str;
}

impl<B: SyncBackend + ?Sized> SyncBackend for std::sync::Arc<B> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, raw: &str) -> StorageResult<()> {
        (**self).set(key, raw)
    }

    fn clear(&self, key: &str) -> StorageResult<()> {
        (**self).clear(key)
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}

#[async_trait]
impl<B: AsyncBackend + ?Sized> AsyncBackend for std::sync::Arc<B> {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, raw: &str) -> StorageResult<()> {
        (**self).set(key, raw).await
    }

    async fn clear(&self, key: &str) -> StorageResult<()> {
        (**self).clear(key).await
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
