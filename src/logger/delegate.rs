use super::Delivery;
use crate::domain::{DeliveryError, LogEntry};

type Action = dyn Fn(&LogEntry) -> Result<(), DeliveryError> + Send + Sync;

/// Delivers through a caller-supplied closure.
pub struct DelegateDelivery {
    action: Box<Action>,
}

impl DelegateDelivery {
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(&LogEntry) -> Result<(), DeliveryError> + Send + Sync + 'static,
    {
        Self {
            action: Box::new(action),
        }
    }

    /// Adapts an infallible callback; every call counts as delivered.
    pub fn from_fn<F>(action: F) -> Self
    where
        F: Fn(&LogEntry) + Send + Sync + 'static,
    {
        Self::new(move |entry| {
            action(entry);
            Ok(())
        })
    }
}

impl Delivery for DelegateDelivery {
    fn deliver(&self, entry: &LogEntry) -> Result<(), DeliveryError> {
        (self.action)(entry)
    }
}
