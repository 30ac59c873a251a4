use crate::domain::{DeliveryError, LogEntry};
use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

type Callback = dyn Fn(&LogEntry) + Send + Sync;

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered list of entry callbacks.
///
/// `emit` walks a snapshot, so callbacks may (un)subscribe while being
/// called. A panicking callback is logged and skipped.
#[derive(Default)]
pub struct SubscriberSet {
    next_id: AtomicU64,
    callbacks: RwLock<Vec<(SubscriptionId, Arc<Callback>)>>,
}

impl SubscriberSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&LogEntry) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.callbacks.write().push((id, Arc::new(callback)));
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self.callbacks.write();
        let before = callbacks.len();
        callbacks.retain(|(registered, _)| *registered != id);
        callbacks.len() != before
    }

    pub fn len(&self) -> usize {
        self.callbacks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.read().is_empty()
    }

    /// Calls every callback in registration order.
    pub fn emit(&self, entry: &LogEntry) {
        let snapshot: Vec<Arc<Callback>> = self
            .callbacks
            .read()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in snapshot {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(entry))) {
                let err = DeliveryError::from_panic(payload.as_ref());
                debug!(error = %err, "Subscriber panicked");
            }
        }
    }
}
