use std::env;
use std::panic::{self, AssertUnwindSafe};

/// Snapshot of the thread that emitted an entry.
///
/// Every field is best-effort: a value that cannot be read is simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadContext {
    pub id: Option<String>,
    pub user: Option<UserContext>,
}

/// The principal the emitting thread ran as.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserContext {
    pub name: Option<String>,
}

impl ThreadContext {
    /// Captures the calling thread's id and the process user.
    pub fn capture() -> Self {
        Self {
            id: current_thread_id(),
            user: current_user().map(|name| UserContext { name: Some(name) }),
        }
    }
}

fn current_thread_id() -> Option<String> {
    // `thread::current()` panics during TLS teardown
    panic::catch_unwind(AssertUnwindSafe(|| {
        let raw = format!("{:?}", std::thread::current().id());
        raw.strip_prefix("ThreadId(")
            .and_then(|rest| rest.strip_suffix(')'))
            .map(str::to_string)
            .unwrap_or(raw)
    }))
    .ok()
}

fn current_user() -> Option<String> {
    ["USER", "USERNAME"]
        .iter()
        .find_map(|key| env::var(key).ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}
