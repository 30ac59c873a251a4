use super::Delivery;
use crate::domain::{DeliveryError, LogEntry};
use parking_lot::Mutex;
use std::sync::Arc;

/// Serializes calls into the inner strategy behind one lock.
///
/// Several wrappers built with the same lock (see [`with_lock`](Self::with_lock))
/// never run their inner strategies concurrently.
pub struct SynchronizedDelivery {
    inner: Arc<dyn Delivery>,
    lock: Arc<Mutex<()>>,
}

impl SynchronizedDelivery {
    pub fn new<D: Delivery + 'static>(inner: D) -> Self {
        Self::with_lock(inner, Arc::new(Mutex::new(())))
    }

    pub fn with_lock<D: Delivery + 'static>(inner: D, lock: Arc<Mutex<()>>) -> Self {
        Self {
            inner: Arc::new(inner),
            lock,
        }
    }

    /// The lock owner, for sharing with other wrappers.
    pub fn lock(&self) -> Arc<Mutex<()>> {
        Arc::clone(&self.lock)
    }
}

impl Delivery for SynchronizedDelivery {
    fn deliver(&self, entry: &LogEntry) -> Result<(), DeliveryError> {
        let _guard = self.lock.lock();
        self.inner.deliver(entry)
    }

    fn deliver_and_wait(&self, entry: &LogEntry) -> Result<(), DeliveryError> {
        let _guard = self.lock.lock();
        self.inner.deliver_and_wait(entry)
    }
}
