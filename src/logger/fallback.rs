use super::{Delivery, guarded};
use crate::domain::{DeliveryError, LogEntry};
use std::sync::Arc;
use tracing::debug;

/// Delivers through `primary`; only if that fails, through `fallback`.
///
/// A panic in either delivery counts as a failure. The reported result is the
/// primary's when it succeeds, otherwise the fallback's.
pub struct FallbackDelivery {
    primary: Arc<dyn Delivery>,
    fallback: Arc<dyn Delivery>,
}

impl FallbackDelivery {
    pub fn new<P, F>(primary: P, fallback: F) -> Self
    where
        P: Delivery + 'static,
        F: Delivery + 'static,
    {
        Self {
            primary: Arc::new(primary),
            fallback: Arc::new(fallback),
        }
    }

    fn route<S>(&self, entry: &LogEntry, step: S) -> Result<(), DeliveryError>
    where
        S: Fn(&dyn Delivery, &LogEntry) -> Result<(), DeliveryError>,
    {
        match guarded(|| step(self.primary.as_ref(), entry)) {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!(error = %e, "Primary delivery failed, using fallback");
                guarded(|| step(self.fallback.as_ref(), entry))
            }
        }
    }
}

impl Delivery for FallbackDelivery {
    fn deliver(&self, entry: &LogEntry) -> Result<(), DeliveryError> {
        self.route(entry, |d, e| d.deliver(e))
    }

    fn deliver_and_wait(&self, entry: &LogEntry) -> Result<(), DeliveryError> {
        self.route(entry, |d, e| d.deliver_and_wait(e))
    }
}
