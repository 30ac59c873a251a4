//! On-demand health snapshots.
//!
//! A [`Monitor`] produces a [`MonitorInfo`] each time it is asked. Readings
//! are plain data and serialize to JSON, so they can be logged like any other
//! message (see [`report`]).

use crate::domain::{DeliveryError, LogCategory, LogPriority};
use crate::logger::Logger;
use chrono::{DateTime, FixedOffset, Local};
use serde::Serialize;
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    #[default]
    None,
    Ok,
    Warning,
    Error,
    /// The monitor itself failed while producing a reading.
    Exception,
}

impl MonitorState {
    /// Category a reading in this state is logged under.
    pub fn category(self) -> LogCategory {
        match self {
            Self::None => LogCategory::Debug,
            Self::Ok => LogCategory::Info,
            Self::Warning => LogCategory::Warning,
            Self::Error => LogCategory::Error,
            Self::Exception => LogCategory::Critical,
        }
    }
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Exception => "exception",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorInfo {
    pub state: MonitorState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub last_update: DateTime<FixedOffset>,
}

impl MonitorInfo {
    fn failed(summary: &str, description: String) -> Self {
        Self {
            state: MonitorState::Exception,
            summary: Some(summary.to_string()),
            description: Some(description),
            value: None,
            last_update: Local::now().fixed_offset(),
        }
    }
}

pub trait Monitor: Send + Sync {
    /// Takes a fresh reading. Never panics; failures come back as
    /// `MonitorState::Exception`.
    fn info(&self) -> MonitorInfo;
}

impl<M: Monitor + ?Sized> Monitor for std::sync::Arc<M> {
    fn info(&self) -> MonitorInfo {
        (**self).info()
    }
}

/// Mutable reading a probe fills in. Starts as state `None`, empty texts and
/// the current time.
#[derive(Debug, Clone)]
pub struct Reading {
    pub state: MonitorState,
    pub summary: String,
    pub description: String,
    pub value: Option<Value>,
    pub last_update: DateTime<FixedOffset>,
}

impl Reading {
    fn new() -> Self {
        Self {
            state: MonitorState::None,
            summary: String::new(),
            description: String::new(),
            value: None,
            last_update: Local::now().fixed_offset(),
        }
    }

    fn finish(self) -> MonitorInfo {
        MonitorInfo {
            state: self.state,
            summary: non_empty(self.summary),
            description: non_empty(self.description),
            value: self.value.filter(|v| !v.is_null()),
            last_update: self.last_update,
        }
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

pub type ProbeError = Box<dyn StdError + Send + Sync>;

type Probe = dyn Fn(&mut Reading) -> Result<(), ProbeError> + Send + Sync;

/// Monitor backed by a closure that fills in a [`Reading`].
pub struct DelegateMonitor {
    probe: Box<Probe>,
}

impl DelegateMonitor {
    pub fn new<F>(probe: F) -> Self
    where
        F: Fn(&mut Reading) -> Result<(), ProbeError> + Send + Sync + 'static,
    {
        Self {
            probe: Box::new(probe),
        }
    }
}

impl Monitor for DelegateMonitor {
    fn info(&self) -> MonitorInfo {
        let mut reading = Reading::new();
        match panic::catch_unwind(AssertUnwindSafe(|| (self.probe)(&mut reading))) {
            Ok(Ok(())) => reading.finish(),
            Ok(Err(e)) => MonitorInfo::failed("probe failed", e.to_string()),
            Err(payload) => {
                let panicked = DeliveryError::from_panic(payload.as_ref());
                MonitorInfo::failed("probe panicked", panicked.to_string())
            }
        }
    }
}

impl fmt::Debug for DelegateMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateMonitor").finish_non_exhaustive()
    }
}

/// Takes a reading and logs it under its state's category.
pub fn report<M: Monitor + ?Sized>(monitor: &M, logger: &Logger, tag: Option<&str>) -> bool {
    let info = monitor.info();
    logger.log(&info, info.state.category(), LogPriority::None, tag)
}
