use super::{Delivery, guarded};
use crate::domain::{DeliveryError, LogEntry};
use std::sync::Arc;
use tokio::runtime::{Handle, TryCurrentError};
use tracing::debug;

/// Fire-and-forget wrapper: hands each entry to the tokio blocking pool.
///
/// `deliver` returns `Ok` as soon as the work is scheduled. Deliveries carry
/// no ordering guarantee relative to call order. Use
/// [`Logger::log_async`](super::Logger::log_async) to observe the outcome.
pub struct AsyncDelivery {
    inner: Arc<dyn Delivery>,
    runtime: Handle,
}

impl AsyncDelivery {
    /// Binds to the runtime of the calling context.
    pub fn new<D: Delivery + 'static>(inner: D) -> Result<Self, TryCurrentError> {
        Ok(Self::with_handle(inner, Handle::try_current()?))
    }

    pub fn with_handle<D: Delivery + 'static>(inner: D, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(inner),
            runtime,
        }
    }
}

impl Delivery for AsyncDelivery {
    fn deliver(&self, entry: &LogEntry) -> Result<(), DeliveryError> {
        let inner = Arc::clone(&self.inner);
        let entry = entry.clone();

        self.runtime.spawn_blocking(move || {
            if let Err(e) = guarded(|| inner.deliver(&entry)) {
                debug!(error = %e, "Background delivery failed");
            }
        });

        Ok(())
    }

    fn deliver_and_wait(&self, entry: &LogEntry) -> Result<(), DeliveryError> {
        self.inner.deliver_and_wait(entry)
    }
}
