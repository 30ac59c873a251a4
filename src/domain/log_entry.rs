use super::category::{LogCategory, LogPriority};
use super::thread::ThreadContext;
use chrono::{DateTime, FixedOffset, Local};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// One immutable unit of diagnostic data flowing through the pipeline.
///
/// Entries created locally carry no `id` and no thread context; both are
/// filled in only when an entry is reconstructed from the wire. Nothing in
/// the pipeline edits an entry after construction: wrappers pass the same
/// value along and the bridge builds a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    id: Option<Uuid>,
    message: Option<Value>,
    category: LogCategory,
    priority: LogPriority,
    tag: Option<String>,
    timestamp: DateTime<FixedOffset>,
    thread: Option<ThreadContext>,
}

impl LogEntry {
    /// Creates an entry stamped with the current local time.
    pub fn new(
        message: Option<Value>,
        category: LogCategory,
        priority: LogPriority,
        tag: Option<&str>,
    ) -> Self {
        Self {
            id: None,
            message: message.filter(|v| !v.is_null()),
            category,
            priority,
            tag: tag.and_then(normalize_tag),
            timestamp: Local::now().fixed_offset(),
            thread: None,
        }
    }

    /// Like [`LogEntry::new`], converting any serializable payload first.
    pub fn from_message<M>(
        message: &M,
        category: LogCategory,
        priority: LogPriority,
        tag: Option<&str>,
    ) -> Result<Self, serde_json::Error>
    where
        M: Serialize + ?Sized,
    {
        let value = serde_json::to_value(message)?;
        Ok(Self::new(Some(value), category, priority, tag))
    }

    /// Rebuilds an entry that arrived over the bridge.
    pub(crate) fn restored(
        id: Uuid,
        message: Option<Value>,
        category: LogCategory,
        priority: LogPriority,
        tag: Option<&str>,
        timestamp: DateTime<FixedOffset>,
        thread: Option<ThreadContext>,
    ) -> Self {
        Self {
            id: Some(id),
            message: message.filter(|v| !v.is_null()),
            category,
            priority,
            tag: tag.and_then(normalize_tag),
            timestamp,
            thread,
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn message(&self) -> Option<&Value> {
        self.message.as_ref()
    }

    pub fn category(&self) -> LogCategory {
        self.category
    }

    pub fn priority(&self) -> LogPriority {
        self.priority
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    pub fn thread(&self) -> Option<&ThreadContext> {
        self.thread.as_ref()
    }

    /// Human-readable message: strings verbatim, other values as compact JSON.
    pub fn message_text(&self) -> String {
        match &self.message {
            None => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Trims and upper-cases a tag; blank tags become `None`.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}
