//! Publish/subscribe fan-out.
//!
//! A [`Notifier`] delivers every published message to each currently
//! subscribed listener, synchronously and in the caller's context. Listeners
//! may subscribe or unsubscribe while a publish is running: publish works on a
//! snapshot of the listener set, and every entry carries an `active` flag that
//! is checked right before the listener is invoked.
//!
//! The flag sits behind a per-entry reentrant lock held for the whole
//! delivery. `unsubscribe` takes the same lock, so once it returns the
//! listener is neither running on another thread nor called again. The lock
//! is reentrant, so a listener may unsubscribe itself. Two listeners that
//! unsubscribe each other from different threads at the same time deadlock.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};
use tracing::error;

type Listener<M> = dyn Fn(&M) + Send + Sync;

struct Entry<M> {
    /// Held while the listener runs and while it is deactivated.
    active: ReentrantMutex<Cell<bool>>,
    listener: Box<Listener<M>>,
}

struct Registry<M> {
    next_id: AtomicU64,
    entries: Mutex<HashMap<u64, Arc<Entry<M>>>>,
}

/// Fan-out of messages to a dynamic set of listeners.
pub struct Notifier<M> {
    registry: Arc<Registry<M>>,
}

impl<M: 'static> Notifier<M> {
    /// Create a notifier with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(0),
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Invoke every subscribed listener with `message`.
    ///
    /// Delivery order is unspecified. A panicking listener is logged and does
    /// not stop delivery to the others.
    pub fn publish(&self, message: &M) {
        let snapshot: Vec<Arc<Entry<M>>> =
            self.registry.entries.lock().values().cloned().collect();

        for entry in snapshot {
            let active = entry.active.lock();
            if !active.get() {
                continue;
            }
            if catch_unwind(AssertUnwindSafe(|| (entry.listener)(message))).is_err() {
                error!("Listener panicked while handling a published message");
            }
        }
    }

    /// Register `listener` and return the handle that removes it.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let entry = Arc::new(Entry {
            active: ReentrantMutex::new(Cell::new(true)),
            listener: Box::new(listener),
        });
        self.registry.entries.lock().insert(id, Arc::clone(&entry));

        let registry: Weak<Registry<M>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            entry.active.lock().set(false);
            if let Some(registry) = registry.upgrade() {
                registry.entries.lock().remove(&id);
            }
        })
    }

    /// Number of currently subscribed listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.registry.entries.lock().len()
    }
}

impl<M: 'static> Default for Notifier<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: 'static> fmt::Debug for Notifier<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Handle returned by [`Notifier::subscribe`].
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`].
#[must_use = "the listener stays subscribed until `unsubscribe` is called"]
pub struct Subscription {
    release: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Subscription {
    fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            release: Mutex::new(Some(Box::new(release))),
        }
    }

    /// Remove the listener. Calls after the first are no-ops.
    pub fn unsubscribe(&self) {
        let release = self.release.lock().take();
        if let Some(release) = release {
            release();
        }
    }

    /// Whether `unsubscribe` has not been called yet.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.release.lock().is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
