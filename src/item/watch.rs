//! Observing an item as a stream of values.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::item::PersistentItem;
use crate::notifier::Subscription;
use crate::strategy::PersistenceStrategy;

/// Latest value of a [`PersistentItem`], kept current by its notifications.
///
/// Obtained from [`PersistentItem::watch`]. The underlying subscription is
/// released when the watch is dropped.
pub struct ItemWatch<T> {
    receiver: watch::Receiver<Option<T>>,
    subscription: Subscription,
}

impl<T: Clone> ItemWatch<T> {
    /// Most recently observed value.
    pub fn current(&self) -> Option<T> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published change and return it.
    ///
    /// Returns `None` once the watch can no longer receive changes.
    pub async fn changed(&mut self) -> Option<Option<T>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Another receiver observing the same values.
    pub fn receiver(&self) -> watch::Receiver<Option<T>> {
        self.receiver.clone()
    }
}

impl<T> Drop for ItemWatch<T> {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}

impl<T, S> PersistentItem<T, S>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    S: PersistenceStrategy,
{
    /// Observe the item.
    ///
    /// The watch starts from [`get_sync`](Self::get_sync). For strategies
    /// without synchronous reads it is then seeded once from [`get`](Self::get),
    /// unless a change was published while that read was in flight.
    pub async fn watch(&self) -> ItemWatch<T> {
        let (sender, receiver) = watch::channel(self.get_sync());
        let sender = Arc::new(sender);
        let published = Arc::new(AtomicBool::new(false));

        let subscription = {
            let sender = Arc::clone(&sender);
            let published = Arc::clone(&published);
            self.subscribe(move |value| {
                published.store(true, Ordering::SeqCst);
                sender.send_replace(value.clone());
            })
        };

        if !self.supports_sync() {
            let current = self.get().await;
            sender.send_if_modified(|slot| {
                if published.load(Ordering::SeqCst) {
                    return false;
                }
                *slot = current;
                true
            });
        }

        ItemWatch {
            receiver,
            subscription,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemOptions;
    use crate::storage::MemoryStore;
    use crate::strategy::SyncStrategy;

    #[tokio::test]
    async fn test_watch_follows_changes() {
        let strategy = Arc::new(SyncStrategy::new(MemoryStore::new()));
        let item: PersistentItem<u32, _> =
            PersistentItem::new(ItemOptions::new("clicks", strategy, |_: &u32| true));
        item.set(1).await;

        let mut watch = item.watch().await;
        assert_eq!(watch.current(), Some(1));

        item.set(2).await;
        assert_eq!(watch.changed().await, Some(Some(2)));

        item.clear().await;
        assert_eq!(watch.changed().await, Some(None));
    }

    #[tokio::test]
    async fn test_dropping_watch_unsubscribes() {
        let strategy = Arc::new(SyncStrategy::new(MemoryStore::new()));
        let item: PersistentItem<u32, _> =
            PersistentItem::new(ItemOptions::new("clicks", strategy, |_: &u32| true));

        let watch = item.watch().await;
        assert_eq!(item.subscriber_count(), 1);
        drop(watch);
        assert_eq!(item.subscriber_count(), 0);
    }
}
