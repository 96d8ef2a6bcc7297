//! Persistent items.
//!
//! A [`PersistentItem`] is a handle on one key of one strategy. It reads and
//! writes typed values through the strategy and announces every successful
//! write or clear to its subscribers.
//!
//! Write and clear failures are logged and swallowed: `set` and `update`
//! return the value they tried to store whether or not it was persisted, and
//! nothing is published for a failed operation.
//!
//! `update` reads and writes in two separate steps without any locking, so
//! two concurrent updates on the same key may both read the same previous
//! value; the last write to complete wins and the other update is lost.

mod watch;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::error;

use crate::error::StorageError;
use crate::notifier::{Notifier, Subscription};
use crate::strategy::{
    DeserializeFn, PersistenceStrategy, ReadOptions, SerializeFn, Strategy, ValidateFn,
    WriteOptions,
};

pub use watch::ItemWatch;

/// Construction options of a [`PersistentItem`].
pub struct ItemOptions<T, S = Strategy> {
    /// Key the item is bound to.
    pub key: String,
    /// Strategy performing the I/O; may be shared with other items.
    pub persistence_strategy: Arc<S>,
    /// Decides which decoded values are valid.
    pub validate: Box<ValidateFn<T>>,
    /// Custom encoder; JSON when `None`.
    pub serialize: Option<Box<SerializeFn<T>>>,
    /// Custom decoder; JSON when `None`.
    pub deserialize: Option<Box<DeserializeFn<T>>>,
}

impl<T, S> ItemOptions<T, S> {
    /// Options with the default JSON codec.
    pub fn new<V>(key: impl Into<String>, persistence_strategy: Arc<S>, validate: V) -> Self
    where
        V: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            persistence_strategy,
            validate: Box::new(validate),
            serialize: None,
            deserialize: None,
        }
    }

    /// Replace the JSON encoder.
    #[must_use]
    pub fn with_serializer<F>(mut self, serialize: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.serialize = Some(Box::new(serialize));
        self
    }

    /// Replace the JSON decoder.
    #[must_use]
    pub fn with_deserializer<F>(mut self, deserialize: F) -> Self
    where
        F: Fn(&str) -> Option<T> + Send + Sync + 'static,
    {
        self.deserialize = Some(Box::new(deserialize));
        self
    }
}

/// A single named value with pluggable persistence and change notification.
pub struct PersistentItem<T, S = Strategy> {
    key: String,
    persistence_strategy: Arc<S>,
    validate: Box<ValidateFn<T>>,
    serialize: Option<Box<SerializeFn<T>>>,
    deserialize: Option<Box<DeserializeFn<T>>>,
    notifier: Notifier<Option<T>>,
}

impl<T, S> PersistentItem<T, S>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    S: PersistenceStrategy,
{
    /// Create an item from its options.
    pub fn new(options: ItemOptions<T, S>) -> Self {
        Self {
            key: options.key,
            persistence_strategy: options.persistence_strategy,
            validate: options.validate,
            serialize: options.serialize,
            deserialize: options.deserialize,
            notifier: Notifier::new(),
        }
    }

    /// Key the item is bound to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Strategy the item reads and writes through.
    pub const fn persistence_strategy(&self) -> &Arc<S> {
        &self.persistence_strategy
    }

    /// Whether [`get_sync`](Self::get_sync) can return a stored value.
    pub fn supports_sync(&self) -> bool {
        self.persistence_strategy.supports_sync()
    }

    fn read_options(&self) -> ReadOptions<'_, T> {
        ReadOptions {
            key: &self.key,
            validate: &*self.validate,
            deserialize: self.deserialize.as_deref(),
        }
    }

    /// Current value, read without suspending.
    ///
    /// Always `None` when the strategy does not support synchronous reads.
    pub fn get_sync(&self) -> Option<T> {
        self.persistence_strategy.get_sync(&self.read_options())
    }

    /// Current value, read from the strategy's authoritative source.
    ///
    /// Missing, undecodable and invalid values, and read failures, all yield `None`.
    pub async fn get(&self) -> Option<T> {
        self.persistence_strategy.get(&self.read_options()).await
    }

    /// Store `value` and publish it to subscribers.
    ///
    /// Returns `value` even if storing failed; in that case nothing is published.
    pub async fn set(&self, value: T) -> T {
        self.persist(value, "set").await
    }

    /// Store `updater(current)` and publish it to subscribers.
    ///
    /// `current` comes from [`get`](Self::get). The read and the write are not
    /// atomic: concurrent updates on the same key can lose each other's effect.
    pub async fn update<F>(&self, updater: F) -> T
    where
        F: FnOnce(Option<T>) -> T + Send,
    {
        let current = self.get().await;
        let value = updater(current);
        self.persist(value, "update").await
    }

    /// Remove the stored value and publish `None` to subscribers.
    ///
    /// A failure is logged and nothing is published.
    pub async fn clear(&self) {
        match self.persistence_strategy.clear(&self.key).await {
            Ok(()) => self.notifier.publish(&None),
            Err(e) => self.report_failure("clear", &e),
        }
    }

    /// Register `listener` for every published change.
    ///
    /// The listener receives `Some(value)` after a successful write and `None`
    /// after a successful clear.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Option<T>) + Send + Sync + 'static,
    {
        self.notifier.subscribe(listener)
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.notifier.listener_count()
    }

    async fn persist(&self, value: T, op: &'static str) -> T {
        let options = WriteOptions {
            key: &self.key,
            value: value.clone(),
            serialize: self.serialize.as_deref(),
        };

        match self.persistence_strategy.set(options).await {
            Ok(written) => self.notifier.publish(&Some(written)),
            Err(e) => self.report_failure(op, &e),
        }

        value
    }

    fn report_failure(&self, op: &'static str, e: &StorageError) {
        error!(
            key = %self.key,
            backend = self.persistence_strategy.backend_name(),
            op,
            error = %e,
            "Persistence operation failed"
        );
        metrics::counter!("persistent_item_write_failures_total", "op" => op).increment(1);
    }
}

impl<T, S> fmt::Debug for PersistentItem<T, S>
where
    T: 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentItem")
            .field("key", &self.key)
            .field("custom_serialize", &self.serialize.is_some())
            .field("custom_deserialize", &self.deserialize.is_some())
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}
