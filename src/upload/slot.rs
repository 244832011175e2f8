//! Shared, observable slot holding the current upload
//!
//! One slot is shared by the upload widget and the generator. Writes are
//! synchronous: every subscriber has been called, in subscription order,
//! before `store` or `clear` returns. Publishes are serialized, so
//! subscribers observe values in the order they were written.

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::config::UploadConfig;
use crate::upload::UploadError;

/// Well-known key the upload is stored under
pub const STORAGE_KEY: &str = "userUploadDataUrl";

/// Name of the change notification
pub const CHANGE_EVENT: &str = "user-uploaded-photo";

type Listener = Arc<dyn Fn(Option<&str>) + Send + Sync>;

struct Inner {
    value: RwLock<Option<String>>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    publish: ReentrantMutex<()>,
    next_id: AtomicU64,
    capacity: Option<usize>,
}

#[derive(Clone)]
pub struct UploadSlot {
    inner: Arc<Inner>,
}

impl Default for UploadSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadSlot {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A slot that refuses values larger than `bytes`, key included
    pub fn with_capacity(bytes: usize) -> Self {
        Self::build(Some(bytes))
    }

    /// A slot honouring `storage_capacity_bytes`, unlimited when unset
    pub fn from_config(config: &UploadConfig) -> Self {
        Self::build(config.storage_capacity_bytes)
    }

    pub fn capacity(&self) -> Option<usize> {
        self.inner.capacity
    }

    fn build(capacity: Option<usize>) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: RwLock::new(None),
                listeners: Mutex::new(Vec::new()),
                publish: ReentrantMutex::new(()),
                next_id: AtomicU64::new(0),
                capacity,
            }),
        }
    }

    pub fn get(&self) -> Option<String> {
        self.inner.value.read().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.value.read().is_none()
    }

    /// Replace the stored value and notify subscribers.
    ///
    /// A value over capacity leaves the slot untouched and notifies no one.
    pub fn store(&self, value: String) -> Result<(), UploadError> {
        if let Some(capacity) = self.inner.capacity {
            let needed = STORAGE_KEY.len() + value.len();
            if needed > capacity {
                return Err(UploadError::Storage(format!(
                    "quota exceeded: {} bytes needed, {} available",
                    needed, capacity
                )));
            }
        }
        self.publish(Some(value));
        Ok(())
    }

    /// Empty the slot and notify subscribers with `None`
    pub fn clear(&self) {
        self.publish(None);
    }

    fn publish(&self, value: Option<String>) {
        let _guard = self.inner.publish.lock();
        *self.inner.value.write() = value.clone();

        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();

        debug!(
            event = CHANGE_EVENT,
            present = value.is_some(),
            subscribers = listeners.len(),
            "Publishing upload change"
        );
        for listener in listeners {
            listener(value.as_deref());
        }
    }

    /// Register `listener`; it stays registered until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, Arc::new(listener)));
        Subscription {
            slot: Arc::downgrade(&self.inner),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

/// Handle returned by [`UploadSlot::subscribe`]
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    slot: Weak<Inner>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.slot.upgrade() {
            inner.listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}
