//! Process-wide "current logger".
//!
//! Code that has no logger handed to it can log through here. Until
//! [`set_logger`] is called every [`log`] reports `false`.

use crate::domain::{LogCategory, LogPriority};
use crate::logger::Logger;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

static CURRENT: RwLock<Option<Arc<Logger>>> = RwLock::new(None);

/// Installs `logger` as the current logger, returning the previous one.
pub fn set_logger(logger: Arc<Logger>) -> Option<Arc<Logger>> {
    CURRENT.write().replace(logger)
}

/// Removes the current logger, returning it.
pub fn clear() -> Option<Arc<Logger>> {
    CURRENT.write().take()
}

pub fn current() -> Option<Arc<Logger>> {
    CURRENT.read().clone()
}

/// Logs through the current logger; `false` when none is installed.
pub fn log<M>(message: &M, category: LogCategory, priority: LogPriority, tag: Option<&str>) -> bool
where
    M: Serialize + ?Sized,
{
    // Release the lock before delivering so a sink may call back in here
    let Some(logger) = current() else {
        return false;
    };
    logger.log(message, category, priority, tag)
}
