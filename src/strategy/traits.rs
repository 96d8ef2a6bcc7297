//! Persistence strategy contract.
//!
//! A strategy turns a key plus a typed codec into reads and writes against
//! some backend. Strategies are stateless: everything they know about a value
//! arrives through [`ReadOptions`] and [`WriteOptions`], so one strategy
//! instance can serve any number of items with different keys and types.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageResult;

/// Type guard deciding whether a decoded value is acceptable.
pub type ValidateFn<T> = dyn Fn(&T) -> bool + Send + Sync;

/// Custom encoder replacing the default JSON encoding.
pub type SerializeFn<T> = dyn Fn(&T) -> String + Send + Sync;

/// Custom decoder replacing the default JSON decoding. `None` means "no value".
pub type DeserializeFn<T> = dyn Fn(&str) -> Option<T> + Send + Sync;

/// Parameters of a read.
pub struct ReadOptions<'a, T> {
    /// Key to read.
    pub key: &'a str,
    /// Validation applied after decoding.
    pub validate: &'a ValidateFn<T>,
    /// Decoder; JSON when `None`.
    pub deserialize: Option<&'a DeserializeFn<T>>,
}

/// Parameters of a write.
pub struct WriteOptions<'a, T> {
    /// Key to write.
    pub key: &'a str,
    /// Value to store.
    pub value: T,
    /// Encoder; JSON when `None`.
    pub serialize: Option<&'a SerializeFn<T>>,
}

/// Capability set every storage backend exposes to persistent items.
///
/// Reads never fail: a missing, undecodable or invalid value, and any backend
/// failure on the read path, all come back as `None`. Writes and clears report
/// backend failures so the caller can decide what to do with them.
#[async_trait]
pub trait PersistenceStrategy: Send + Sync {
    /// Whether [`get_sync`](Self::get_sync) can return a stored value.
    fn supports_sync(&self) -> bool;

    /// Read without suspending. Strategies that cannot do so return `None`.
    fn get_sync<T>(&self, options: &ReadOptions<'_, T>) -> Option<T>
    where
        T: Serialize + DeserializeOwned;

    /// Authoritative read.
    async fn get<T>(&self, options: &ReadOptions<'_, T>) -> Option<T>
    where
        T: Serialize + DeserializeOwned + Send;

    /// Write-through; resolves with the written value.
    async fn set<T>(&self, options: WriteOptions<'_, T>) -> StorageResult<T>
    where
        T: Serialize + Send;

    /// Remove the stored value. Clearing an absent key is not an error.
    async fn clear(&self, key: &str) -> StorageResult<()>;

    /// Name of the underlying backend, for logs.
    fn backend_name(&self) -> &'static str;
}
