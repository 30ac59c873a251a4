//! Delivery core and the composable delivery strategies.
//!
//! A [`Logger`] builds an immutable [`LogEntry`], runs it through its
//! [`Filter`]s and hands accepted entries to one [`Delivery`] strategy.
//! Strategies nest: a `Logger` is itself a `Delivery`, so wrappers such as
//! [`FallbackDelivery`] or [`AggregateDelivery`] can hold whole loggers.
//!
//! ```text
//! Logger::log ─► filters ─► Delivery
//!                             ├── TextDelivery        (direct write)
//!                             ├── DelegateDelivery    (closure)
//!                             ├── SynchronizedDelivery ─► inner
//!                             ├── AsyncDelivery        ─► inner (blocking pool)
//!                             ├── FallbackDelivery     ─► primary, else fallback
//!                             ├── AggregateDelivery    ─► [Logger, Logger, ...]
//!                             └── bridge::HttpSender   ─► remote receivers
//! ```

pub mod aggregate;
pub mod asynchronous;
pub mod delegate;
pub mod fallback;
pub mod filter;
pub mod synchronized;
pub mod text;

pub use aggregate::AggregateDelivery;
pub use asynchronous::AsyncDelivery;
pub use delegate::DelegateDelivery;
pub use fallback::FallbackDelivery;
pub use filter::{CategoryFilter, Filter, PriorityFilter, TagFilter};
pub use synchronized::SynchronizedDelivery;
pub use text::TextDelivery;

use crate::domain::{DeliveryError, LogCategory, LogEntry, LogPriority};
use serde::Serialize;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// A pluggable policy deciding how an accepted entry reaches its sink.
///
/// `Ok(())` means delivered, any `Err` means the entry was not recorded.
#[cfg_attr(test, automock)]
pub trait Delivery: Send + Sync {
    fn deliver(&self, entry: &LogEntry) -> Result<(), DeliveryError>;

    /// Delivers and reports the final outcome even when `deliver` would
    /// only schedule the work. Used by [`Logger::log_async`].
    fn deliver_and_wait(&self, entry: &LogEntry) -> Result<(), DeliveryError> {
        self.deliver(entry)
    }
}

impl<D: Delivery + ?Sized> Delivery for Arc<D> {
    fn deliver(&self, entry: &LogEntry) -> Result<(), DeliveryError> {
        (**self).deliver(entry)
    }

    fn deliver_and_wait(&self, entry: &LogEntry) -> Result<(), DeliveryError> {
        (**self).deliver_and_wait(entry)
    }
}

/// Runs a delivery step, turning a panic into `DeliveryError::Panicked`.
pub(crate) fn guarded<F>(step: F) -> Result<(), DeliveryError>
where
    F: FnOnce() -> Result<(), DeliveryError>,
{
    panic::catch_unwind(AssertUnwindSafe(step))
        .unwrap_or_else(|payload| Err(DeliveryError::from_panic(payload.as_ref())))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchMode {
    Detached,
    Wait,
}

/// The delivery core: filter chain plus one delivery strategy.
///
/// `log` never panics and never returns an error. Filtered entries count as
/// delivered; strategy errors and panics count as not delivered.
pub struct Logger {
    filters: Vec<Box<dyn Filter>>,
    delivery: Arc<dyn Delivery>,
}

impl Logger {
    pub fn new<D: Delivery + 'static>(delivery: D) -> Self {
        Self {
            filters: Vec::new(),
            delivery: Arc::new(delivery),
        }
    }

    pub fn builder<D: Delivery + 'static>(delivery: D) -> LoggerBuilder {
        LoggerBuilder {
            filters: Vec::new(),
            delivery: Arc::new(delivery),
        }
    }

    /// Builds an entry from the arguments and delivers it.
    pub fn log<M>(
        &self,
        message: &M,
        category: LogCategory,
        priority: LogPriority,
        tag: Option<&str>,
    ) -> bool
    where
        M: Serialize + ?Sized,
    {
        match LogEntry::from_message(message, category, priority, tag) {
            Ok(entry) => self.log_entry(&entry),
            Err(e) => {
                debug!(error = %e, "Dropping log entry with unserializable message");
                false
            }
        }
    }

    /// Delivers an already constructed entry.
    pub fn log_entry(&self, entry: &LogEntry) -> bool {
        self.dispatch(entry, DispatchMode::Detached)
    }

    /// Delivers on the tokio blocking pool and resolves to the final outcome.
    ///
    /// The entry (and its timestamp) is built before this returns. Unlike
    /// `log`, an [`AsyncDelivery`] inside the chain is awaited rather than
    /// fired and forgotten.
    pub fn log_async<M>(
        self: &Arc<Self>,
        message: &M,
        category: LogCategory,
        priority: LogPriority,
        tag: Option<&str>,
    ) -> impl Future<Output = bool> + Send + 'static + use<M>
    where
        M: Serialize + ?Sized,
    {
        let entry = LogEntry::from_message(message, category, priority, tag);
        let logger = Arc::clone(self);

        async move {
            let Ok(entry) = entry else {
                return false;
            };
            tokio::task::spawn_blocking(move || logger.dispatch(&entry, DispatchMode::Wait))
                .await
                .unwrap_or(false)
        }
    }

    pub fn emergency<M: Serialize + ?Sized>(&self, message: &M) -> bool {
        self.log(message, LogCategory::Emergency, LogPriority::None, None)
    }

    pub fn alert<M: Serialize + ?Sized>(&self, message: &M) -> bool {
        self.log(message, LogCategory::Alert, LogPriority::None, None)
    }

    pub fn critical<M: Serialize + ?Sized>(&self, message: &M) -> bool {
        self.log(message, LogCategory::Critical, LogPriority::None, None)
    }

    pub fn error<M: Serialize + ?Sized>(&self, message: &M) -> bool {
        self.log(message, LogCategory::Error, LogPriority::None, None)
    }

    pub fn warn<M: Serialize + ?Sized>(&self, message: &M) -> bool {
        self.log(message, LogCategory::Warning, LogPriority::None, None)
    }

    pub fn notice<M: Serialize + ?Sized>(&self, message: &M) -> bool {
        self.log(message, LogCategory::Notice, LogPriority::None, None)
    }

    pub fn info<M: Serialize + ?Sized>(&self, message: &M) -> bool {
        self.log(message, LogCategory::Info, LogPriority::None, None)
    }

    pub fn debug<M: Serialize + ?Sized>(&self, message: &M) -> bool {
        self.log(message, LogCategory::Debug, LogPriority::None, None)
    }

    pub fn trace<M: Serialize + ?Sized>(&self, message: &M) -> bool {
        self.log(message, LogCategory::Trace, LogPriority::None, None)
    }

    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    fn dispatch(&self, entry: &LogEntry, mode: DispatchMode) -> bool {
        let outcome = guarded(|| {
            // First rejection wins; a skipped entry still counts as delivered
            if let Some(filter) = self.filters.iter().find(|f| !f.accept(entry)) {
                debug!(filter = filter.name(), "Log entry filtered out");
                return Ok(());
            }

            match mode {
                DispatchMode::Detached => self.delivery.deliver(entry),
                DispatchMode::Wait => self.delivery.deliver_and_wait(entry),
            }
        });

        match outcome {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, category = %entry.category(), "Log entry not delivered");
                false
            }
        }
    }
}

impl Delivery for Logger {
    fn deliver(&self, entry: &LogEntry) -> Result<(), DeliveryError> {
        if self.dispatch(entry, DispatchMode::Detached) {
            Ok(())
        } else {
            Err(DeliveryError::rejected("logger reported failure"))
        }
    }

    fn deliver_and_wait(&self, entry: &LogEntry) -> Result<(), DeliveryError> {
        if self.dispatch(entry, DispatchMode::Wait) {
            Ok(())
        } else {
            Err(DeliveryError::rejected("logger reported failure"))
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field(
                "filters",
                &self.filters.iter().map(|flt| flt.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Registers filters before the logger is first used.
pub struct LoggerBuilder {
    filters: Vec<Box<dyn Filter>>,
    delivery: Arc<dyn Delivery>,
}

impl LoggerBuilder {
    /// Appends a filter; filters run in the order they were added.
    pub fn filter<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn build(self) -> Logger {
        Logger {
            filters: self.filters,
            delivery: self.delivery,
        }
    }
}
