use crate::domain::{LogCategory, LogEntry, LogPriority, ThreadContext, UserContext};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// JSON body exchanged between `HttpSender` and `BridgeReceiver`.
///
/// Every field is optional: absent fields are skipped on output and
/// tolerated on input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prio: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<WireThread>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireThread {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<WireUser>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl BridgeMessage {
    /// Outgoing form of `entry` under a freshly assigned message id.
    pub fn from_entry(entry: &LogEntry, id: Uuid, thread: Option<&ThreadContext>) -> Self {
        Self {
            id: Some(id.simple().to_string()),
            cat: Some(entry.category().as_i32().into()),
            msg: entry.message().cloned(),
            prio: Some(entry.priority().as_i32().into()),
            tag: entry.tag().map(str::to_string),
            thread: thread.map(WireThread::from),
            time: Some(entry.timestamp().to_rfc3339()),
        }
    }

    /// Rebuilds an entry, filling gaps with defaults.
    ///
    /// A missing or malformed id gets a fresh one, a missing or malformed
    /// timestamp becomes `received_at`, unknown category or priority values
    /// map to the defaults.
    pub fn into_entry(self, received_at: DateTime<FixedOffset>) -> LogEntry {
        let id = self
            .id
            .as_deref()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .unwrap_or_else(Uuid::new_v4);

        let timestamp = self
            .time
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
            .unwrap_or(received_at);

        let category = self
            .cat
            .and_then(|v| i32::try_from(v).ok())
            .and_then(LogCategory::from_i32)
            .unwrap_or_default();
        let priority = self
            .prio
            .and_then(|v| i32::try_from(v).ok())
            .and_then(LogPriority::from_i32)
            .unwrap_or_default();

        LogEntry::restored(
            id,
            self.msg,
            category,
            priority,
            self.tag.as_deref(),
            timestamp,
            self.thread.map(ThreadContext::from),
        )
    }
}

impl From<&ThreadContext> for WireThread {
    fn from(ctx: &ThreadContext) -> Self {
        Self {
            id: ctx.id.clone(),
            user: ctx.user.as_ref().map(|u| WireUser {
                name: u.name.clone(),
            }),
        }
    }
}

impl From<WireThread> for ThreadContext {
    fn from(wire: WireThread) -> Self {
        Self {
            id: wire.id,
            user: wire.user.map(|u| UserContext { name: u.name }),
        }
    }
}
