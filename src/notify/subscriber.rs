//! Subscriber-based notifications for push-triggered reloads.

use crate::core::{FlatMapping, SourceKey};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

/// Describes one successful push-triggered re-merge.
#[derive(Debug, Clone)]
pub struct ReloadEvent {
    /// The source whose push notification caused the re-merge
    pub source: SourceKey,
    /// The snapshot published by the re-merge
    pub snapshot: Arc<FlatMapping>,
}

type Callback = Arc<dyn Fn(&ReloadEvent) + Send + Sync>;

/// Internal subscriber registry state.
struct SubscriberRegistryInner {
    subscribers: Vec<(usize, Callback)>,
    next_id: usize,
}

/// Handle for a subscription that can be dropped to unsubscribe.
///
/// When the handle is dropped, the subscription is removed immediately.
pub struct SubscriptionHandle {
    id: usize,
    registry: Weak<RwLock<SubscriberRegistryInner>>,
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let id = self.id;
            registry.write().subscribers.retain(|(sub_id, _)| *sub_id != id);
        }
    }
}

/// Registry of reload callbacks.
///
/// Callbacks run on the thread that delivered the push notification, in the
/// order they were subscribed. The registry lock is released before callbacks
/// run, so a callback may subscribe or drop handles itself.
///
/// # Examples
///
/// ```rust
/// use hotswap_nacos::notify::SubscriberRegistry;
///
/// let registry = SubscriberRegistry::new();
/// let handle = registry.subscribe(|event| {
///     println!("{} reloaded, {} keys", event.source, event.snapshot.len());
/// });
///
/// assert_eq!(registry.subscriber_count(), 1);
/// drop(handle);
/// assert_eq!(registry.subscriber_count(), 0);
/// ```
pub struct SubscriberRegistry {
    inner: Arc<RwLock<SubscriberRegistryInner>>,
}

impl SubscriberRegistry {
    /// Create a new subscriber registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SubscriberRegistryInner {
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Register a callback invoked after every push-triggered reload.
    ///
    /// Returns a handle that unsubscribes when dropped.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&ReloadEvent) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(callback)));

        SubscriptionHandle {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Invoke every subscriber with `event`.
    pub fn notify_all(&self, event: &ReloadEvent) {
        let callbacks: Vec<Callback> = self
            .inner
            .read()
            .subscribers
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(event);
        }
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.read().subscribers.len()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SubscriberRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
