use super::{Delivery, Logger, guarded};
use crate::domain::{DeliveryError, LogEntry};
use std::sync::Arc;

/// Fans one entry out to an ordered list of independent loggers.
///
/// Every member is invoked even when earlier ones fail or panic. The result
/// is a success when the list is empty or at least one member succeeded, and
/// `DeliveryError::AllFailed` only when every member failed.
#[derive(Default)]
pub struct AggregateDelivery {
    loggers: Vec<Arc<Logger>>,
}

impl AggregateDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, logger: Arc<Logger>) -> Self {
        self.loggers.push(logger);
        self
    }

    pub fn push(&mut self, logger: Arc<Logger>) {
        self.loggers.push(logger);
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }

    fn fan_out<S>(&self, entry: &LogEntry, step: S) -> Result<(), DeliveryError>
    where
        S: Fn(&Logger, &LogEntry) -> Result<(), DeliveryError>,
    {
        // None: nothing attempted yet
        let mut all_failed: Option<bool> = None;

        for logger in &self.loggers {
            let failed = guarded(|| step(logger.as_ref(), entry)).is_err();
            if !failed {
                all_failed = Some(false);
            } else if all_failed.is_none() {
                all_failed = Some(true);
            }
        }

        match all_failed {
            Some(true) => Err(DeliveryError::AllFailed {
                attempted: self.loggers.len(),
            }),
            _ => Ok(()),
        }
    }
}

impl FromIterator<Arc<Logger>> for AggregateDelivery {
    fn from_iter<I: IntoIterator<Item = Arc<Logger>>>(iter: I) -> Self {
        Self {
            loggers: iter.into_iter().collect(),
        }
    }
}

impl Delivery for AggregateDelivery {
    fn deliver(&self, entry: &LogEntry) -> Result<(), DeliveryError> {
        self.fan_out(entry, |logger, e| logger.deliver(e))
    }

    fn deliver_and_wait(&self, entry: &LogEntry) -> Result<(), DeliveryError> {
        self.fan_out(entry, |logger, e| logger.deliver_and_wait(e))
    }
}
