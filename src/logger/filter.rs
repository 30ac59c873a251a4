//! Predicate gates applied before delivery.

use crate::domain::{LogCategory, LogEntry, LogPriority, normalize_tag};
use std::collections::HashSet;

/// Decides whether an entry may reach the delivery strategy.
pub trait Filter: Send + Sync {
    fn accept(&self, entry: &LogEntry) -> bool;

    /// Filter name for debugging
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<F> Filter for F
where
    F: Fn(&LogEntry) -> bool + Send + Sync,
{
    fn accept(&self, entry: &LogEntry) -> bool {
        self(entry)
    }

    fn name(&self) -> &'static str {
        "closure"
    }
}

/// Severity threshold: passes entries at least as severe as `threshold`.
#[derive(Debug, Clone, Copy)]
pub struct CategoryFilter {
    threshold: LogCategory,
}

impl CategoryFilter {
    pub fn new(threshold: LogCategory) -> Self {
        Self { threshold }
    }
}

impl Filter for CategoryFilter {
    fn accept(&self, entry: &LogEntry) -> bool {
        entry.category().is_within(self.threshold)
    }

    fn name(&self) -> &'static str {
        "category"
    }
}

/// Passes entries whose priority is at least `minimum`.
#[derive(Debug, Clone, Copy)]
pub struct PriorityFilter {
    minimum: LogPriority,
}

impl PriorityFilter {
    pub fn new(minimum: LogPriority) -> Self {
        Self { minimum }
    }
}

impl Filter for PriorityFilter {
    fn accept(&self, entry: &LogEntry) -> bool {
        entry.priority() >= self.minimum
    }

    fn name(&self) -> &'static str {
        "priority"
    }
}

/// Allow-list of tags. Untagged entries pass only if `allow_untagged` is set.
#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    tags: HashSet<String>,
    allow_untagged: bool,
}

impl TagFilter {
    pub fn allow(tags: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Self {
            tags: tags
                .into_iter()
                .filter_map(|t| normalize_tag(t.as_ref()))
                .collect(),
            allow_untagged: false,
        }
    }

    pub fn allow_untagged(mut self, allow: bool) -> Self {
        self.allow_untagged = allow;
        self
    }
}

impl Filter for TagFilter {
    fn accept(&self, entry: &LogEntry) -> bool {
        match entry.tag() {
            Some(tag) => self.tags.contains(tag),
            None => self.allow_untagged,
        }
    }

    fn name(&self) -> &'static str {
        "tag"
    }
}
